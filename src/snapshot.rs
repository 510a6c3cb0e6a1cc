//! 執行後可供檢查的 CPU 狀態

use std::fmt;

use serde::Serialize;

use crate::cpu::{Cpu, CpuState, InterruptMasterState};
use crate::registers::Flags;

/// 旗標，依名稱展開
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlagBits {
    pub z: bool,
    pub n: bool,
    pub h: bool,
    pub c: bool,
}

impl From<Flags> for FlagBits {
    fn from(flags: Flags) -> Self {
        FlagBits {
            z: flags.contains(Flags::Z),
            n: flags.contains(Flags::N),
            h: flags.contains(Flags::H),
            c: flags.contains(Flags::C),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,
    pub sp: u16,
    pub pc: u16,
    pub flags: FlagBits,
    pub state: CpuState,
    pub ime: InterruptMasterState,
    pub cycles: u64,
    pub instructions: u64,
}

impl Snapshot {
    pub fn capture(cpu: &Cpu, cycles: u64, instructions: u64) -> Self {
        let r = &cpu.registers;
        Snapshot {
            a: r.get_a(),
            f: r.get_f(),
            b: r.get_b(),
            c: r.get_c(),
            d: r.get_d(),
            e: r.get_e(),
            h: r.get_h(),
            l: r.get_l(),
            sp: r.get_sp(),
            pc: r.get_pc(),
            flags: r.flags().into(),
            state: cpu.state,
            ime: cpu.ime,
            cycles,
            instructions,
        }
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |on: bool, name: char| if on { name } else { '-' };
        writeln!(
            f,
            "A={:02X} F={:02X} B={:02X} C={:02X} D={:02X} E={:02X} H={:02X} L={:02X}",
            self.a, self.f, self.b, self.c, self.d, self.e, self.h, self.l
        )?;
        writeln!(
            f,
            "SP={:04X} PC={:04X} flags={}{}{}{}",
            self.sp,
            self.pc,
            flag(self.flags.z, 'Z'),
            flag(self.flags.n, 'N'),
            flag(self.flags.h, 'H'),
            flag(self.flags.c, 'C'),
        )?;
        write!(
            f,
            "state={:?} ime={:?} instructions={} cycles={}",
            self.state, self.ime, self.instructions, self.cycles
        )
    }
}
