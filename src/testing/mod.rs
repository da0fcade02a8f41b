//! Host-side test doubles
//!
//! `FakeDevice` is a 256-byte register file behind a [`RegisterBus`]. Every
//! read, write and delay lands in one shared log so tests can check the exact
//! order of bus traffic.

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::blocking::delay::DelayMs;

use crate::hal::RegisterBus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Read { address: u8, register: u8, len: usize },
    Write { address: u8, register: u8, bytes: Vec<u8> },
    DelayMs(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeBusError;

struct State {
    regs: [u8; 256],
    ops: Vec<Op>,
    /// Bus operations left before every access fails
    fail_after: Option<usize>,
}

/// Shared-state fake; clones observe the same registers and log
#[derive(Clone)]
pub struct FakeDevice {
    state: Rc<RefCell<State>>,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(State {
                regs: [0; 256],
                ops: Vec::new(),
                fail_after: None,
            })),
        }
    }

    pub fn delay(&self) -> FakeDelay {
        FakeDelay {
            state: self.state.clone(),
        }
    }

    pub fn poke(&self, register: u8, bytes: &[u8]) {
        let mut state = self.state.borrow_mut();
        let start = register as usize;
        state.regs[start..start + bytes.len()].copy_from_slice(bytes);
    }

    pub fn peek(&self, register: u8, len: usize) -> Vec<u8> {
        let state = self.state.borrow();
        let start = register as usize;
        state.regs[start..start + len].to_vec()
    }

    pub fn ops(&self) -> Vec<Op> {
        self.state.borrow().ops.clone()
    }

    /// Only the writes, as `(register, bytes)`
    pub fn writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                Op::Write { register, bytes, .. } => Some((register, bytes)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_ops(&self) {
        self.state.borrow_mut().ops.clear();
    }

    /// Let `count` more bus operations succeed, then fail all of them
    pub fn fail_after(&self, count: usize) {
        self.state.borrow_mut().fail_after = Some(count);
    }

    fn tick(state: &mut State) -> Result<(), FakeBusError> {
        match state.fail_after {
            Some(0) => Err(FakeBusError),
            Some(n) => {
                state.fail_after = Some(n - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl RegisterBus for FakeDevice {
    type Error = FakeBusError;

    fn read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        Self::tick(&mut state)?;
        let start = register as usize;
        buffer.copy_from_slice(&state.regs[start..start + buffer.len()]);
        state.ops.push(Op::Read {
            address,
            register,
            len: buffer.len(),
        });
        Ok(())
    }

    fn write(&mut self, address: u8, register: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        Self::tick(&mut state)?;
        let start = register as usize;
        state.regs[start..start + bytes.len()].copy_from_slice(bytes);
        state.ops.push(Op::Write {
            address,
            register,
            bytes: bytes.to_vec(),
        });
        Ok(())
    }
}

/// Delay that only records how long it was asked to wait
pub struct FakeDelay {
    state: Rc<RefCell<State>>,
}

impl DelayMs<u8> for FakeDelay {
    fn delay_ms(&mut self, ms: u8) {
        self.state.borrow_mut().ops.push(Op::DelayMs(ms as u32));
    }
}
