//! Scripted transport for unit tests

use alloc::collections::VecDeque;
use alloc::vec::Vec;

use crate::error::Result;
use crate::programmer::SpiMaster;
use crate::spi::{opcodes, SpiCommand};

/// Transport answering from a script instead of a device model
///
/// Status reads pop from a queue and fall back to "ready" once it runs dry.
/// Other feature registers are plain storage. Every command advances the
/// clock by `tick_us`.
pub(crate) struct ScriptedMaster {
    status: VecDeque<u8>,
    stuck_busy: bool,
    features: [u8; 256],
    id: [u8; 3],
    aux_ecc: u8,
    tick_us: u64,
    now: u64,
    max_len: usize,
    opcodes: Vec<u8>,
    status_reads: usize,
    delays: usize,
    atomic_commands: usize,
}

impl ScriptedMaster {
    pub fn new() -> Self {
        Self {
            status: VecDeque::new(),
            stuck_busy: false,
            features: [0; 256],
            id: [0xFF; 3],
            aux_ecc: 0,
            tick_us: 1,
            now: 0,
            max_len: 4096,
            opcodes: Vec::new(),
            status_reads: 0,
            delays: 0,
            atomic_commands: 0,
        }
    }

    pub fn push_status(&mut self, values: &[u8]) {
        self.status.extend(values.iter().copied());
    }

    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    pub fn set_feature(&mut self, register: u8, value: u8) {
        self.features[register as usize] = value;
    }

    pub fn feature(&self, register: u8) -> u8 {
        self.features[register as usize]
    }

    pub fn set_id(&mut self, manufacturer: u8, device: u16) {
        self.id = [manufacturer, (device >> 8) as u8, device as u8];
    }

    pub fn set_aux_ecc(&mut self, value: u8) {
        self.aux_ecc = value;
    }

    pub fn set_tick_us(&mut self, tick: u64) {
        self.tick_us = tick;
    }

    pub fn set_max_len(&mut self, len: usize) {
        self.max_len = len;
    }

    pub fn opcodes(&self) -> &[u8] {
        &self.opcodes
    }

    pub fn clear_opcodes(&mut self) {
        self.opcodes.clear();
    }

    pub fn status_reads(&self) -> usize {
        self.status_reads
    }

    pub fn delays(&self) -> usize {
        self.delays
    }

    pub fn atomic_commands(&self) -> usize {
        self.atomic_commands
    }

    fn run(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.now += self.tick_us;
        self.opcodes.push(cmd.opcode);

        match cmd.opcode {
            opcodes::GET_FEATURE => {
                let register = cmd.address.unwrap_or(0) as u8;
                let value = if register == opcodes::FEATURE_STATUS {
                    self.status_reads += 1;
                    if self.stuck_busy {
                        opcodes::SR_OIP
                    } else {
                        self.status.pop_front().unwrap_or(0)
                    }
                } else {
                    self.features[register as usize]
                };
                cmd.read_buf.fill(value);
            }
            opcodes::SET_FEATURE => {
                let register = cmd.address.unwrap_or(0) as u8;
                if let Some(&value) = cmd.write_data.first() {
                    self.features[register as usize] = value;
                }
            }
            opcodes::READ_ID => {
                for (dst, src) in cmd.read_buf.iter_mut().zip(self.id) {
                    *dst = src;
                }
            }
            opcodes::MX_GET_ECC_STATUS => cmd.read_buf.fill(self.aux_ecc),
            _ => cmd.read_buf.fill(0xFF),
        }
        Ok(())
    }
}

impl SpiMaster for ScriptedMaster {
    fn max_read_len(&self) -> usize {
        self.max_len
    }

    fn max_write_len(&self) -> usize {
        self.max_len
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.run(cmd)
    }

    fn execute_atomic(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        self.atomic_commands += 1;
        self.run(cmd)
    }

    fn delay_us(&mut self, us: u32) {
        self.delays += 1;
        self.now += us as u64;
    }

    fn now_us(&self) -> u64 {
        self.now
    }
}
