//! 雜項指令的處理模組
//!
//! 這個模組負責處理 LDH, CPL, DAA, SCF, CCF 等雜項指令

use super::{operand, read8, write8};
use crate::cpu::Cpu;
use crate::instruction::Instruction;
use crate::mmu::Memory;
use crate::registers::Flags;

/// 處理 LDH (Load High) 指令：(a8) 與 (C) 都落在 0xFF00 頁
pub fn handle_ldh(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    if let (Some(dst), Some(src)) = (operand(instruction, 0), operand(instruction, 1)) {
        let value = read8(cpu, memory, src, instruction);
        write8(cpu, memory, dst, instruction, value);
    }
}

/// 處理 CPL (Complement) 指令
pub fn handle_cpl(cpu: &mut Cpu) {
    let a = cpu.registers.get_a();
    cpu.registers.set_a(!a);
    cpu.registers.set_flag(Flags::N, true);
    cpu.registers.set_flag(Flags::H, true);
}

/// 處理 DAA (Decimal Adjust Accumulator) 指令
pub fn handle_daa(cpu: &mut Cpu) {
    let regs = &mut cpu.registers;
    let mut a = regs.get_a();
    let mut carry = regs.flag(Flags::C);
    let half = regs.flag(Flags::H);

    if !regs.flag(Flags::N) {
        if carry || a > 0x99 {
            a = a.wrapping_add(0x60);
            carry = true;
        }
        if half || (a & 0x0F) > 0x09 {
            a = a.wrapping_add(0x06);
        }
    } else {
        if carry {
            a = a.wrapping_sub(0x60);
        }
        if half {
            a = a.wrapping_sub(0x06);
        }
    }

    regs.set_a(a);
    regs.set_flag(Flags::Z, a == 0);
    regs.set_flag(Flags::H, false);
    regs.set_flag(Flags::C, carry);
}

/// 處理 SCF 指令 (設定進位旗標)
pub fn handle_scf(cpu: &mut Cpu) {
    cpu.registers.set_flag(Flags::N, false);
    cpu.registers.set_flag(Flags::H, false);
    cpu.registers.set_flag(Flags::C, true);
}

/// 處理 CCF (Complement Carry Flag) 指令
pub fn handle_ccf(cpu: &mut Cpu) {
    let carry = cpu.registers.flag(Flags::C);
    cpu.registers.set_flag(Flags::N, false);
    cpu.registers.set_flag(Flags::H, false);
    cpu.registers.set_flag(Flags::C, !carry);
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::registers::Flags;

    #[test]
    fn test_daa_after_add() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_a(0x45);
        cpu.registers.set_b(0x38);
        run_one(&mut cpu, &mut mem, &[0x80]); // ADD A,B -> 0x7D
        run_one(&mut cpu, &mut mem, &[0x27]); // DAA
        assert_eq!(cpu.registers.get_a(), 0x83);
        assert!(!cpu.registers.flag(Flags::C));

        cpu.registers.set_a(0x99);
        cpu.registers.set_b(0x01);
        run_one(&mut cpu, &mut mem, &[0x80]); // 0x9A
        run_one(&mut cpu, &mut mem, &[0x27]);
        assert_eq!(cpu.registers.get_a(), 0x00);
        assert!(cpu.registers.flag(Flags::Z));
        assert!(cpu.registers.flag(Flags::C));
    }

    #[test]
    fn test_daa_after_sub() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_a(0x42);
        run_one(&mut cpu, &mut mem, &[0xD6, 0x09]); // SUB 09 -> 0x39, H
        run_one(&mut cpu, &mut mem, &[0x27]);
        assert_eq!(cpu.registers.get_a(), 0x33);
    }

    #[test]
    fn test_cpl_scf_ccf() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_a(0x0F);
        run_one(&mut cpu, &mut mem, &[0x2F]); // CPL
        assert_eq!(cpu.registers.get_a(), 0xF0);
        assert_eq!(cpu.registers.get_f(), 0x60);

        run_one(&mut cpu, &mut mem, &[0x37]); // SCF
        assert_eq!(cpu.registers.get_f(), 0x10);
        run_one(&mut cpu, &mut mem, &[0x3F]); // CCF
        assert_eq!(cpu.registers.get_f(), 0x00);
    }
}
