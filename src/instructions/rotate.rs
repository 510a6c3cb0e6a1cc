//! 旋轉、移位與位元指令的處理模組
//!
//! 累加器旋轉 (RLCA/RRCA/RLA/RRA) 與 CB 前綴的 RLC/RRC/RL/RR/SLA/SRA/SWAP/SRL
//! 共用同一個移位函式；前者一律清除 Z。

use super::{last_operand, operand, read8, write8};
use crate::cpu::Cpu;
use crate::instruction::Instruction;
use crate::mmu::Memory;
use crate::opcodes::{Mnemonic, Operand};
use crate::registers::Flags;

/// 回傳 (結果, 新的進位)
fn shift(mnemonic: Mnemonic, value: u8, carry_in: bool) -> (u8, bool) {
    let c = carry_in as u8;
    match mnemonic {
        Mnemonic::Rlc | Mnemonic::Rlca => (value.rotate_left(1), value & 0x80 != 0),
        Mnemonic::Rrc | Mnemonic::Rrca => (value.rotate_right(1), value & 0x01 != 0),
        Mnemonic::Rl | Mnemonic::Rla => ((value << 1) | c, value & 0x80 != 0),
        Mnemonic::Rr | Mnemonic::Rra => ((value >> 1) | (c << 7), value & 0x01 != 0),
        Mnemonic::Sla => (value << 1, value & 0x80 != 0),
        Mnemonic::Sra => ((value >> 1) | (value & 0x80), value & 0x01 != 0),
        Mnemonic::Srl => (value >> 1, value & 0x01 != 0),
        Mnemonic::Swap => (value.rotate_left(4), false),
        _ => (value, carry_in),
    }
}

/// 處理 RLCA, RRCA, RLA, RRA
pub fn handle_rotate_a(cpu: &mut Cpu, instruction: &Instruction) {
    let carry_in = cpu.registers.flag(Flags::C);
    let (result, carry) = shift(instruction.mnemonic(), cpu.registers.get_a(), carry_in);
    cpu.registers.set_a(result);
    cpu.registers.update_flags(false, false, false, carry);
}

/// 處理 CB 前綴的旋轉與移位
pub fn handle_shift(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let Some(target) = last_operand(instruction) else {
        return;
    };
    let value = read8(cpu, memory, target, instruction);
    let carry_in = cpu.registers.flag(Flags::C);
    let (result, carry) = shift(instruction.mnemonic(), value, carry_in);
    write8(cpu, memory, target, instruction, result);
    cpu.registers.update_flags(result == 0, false, false, carry);
}

fn bit_index(instruction: &Instruction) -> u8 {
    match operand(instruction, 0) {
        Some(Operand::Bit(bit)) => bit & 0x07,
        _ => 0,
    }
}

/// 處理 BIT 指令 (測試位元)
pub fn handle_bit(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let Some(target) = last_operand(instruction) else {
        return;
    };
    let value = read8(cpu, memory, target, instruction);
    let set = value & (1 << bit_index(instruction)) != 0;
    cpu.registers.set_flag(Flags::Z, !set);
    cpu.registers.set_flag(Flags::N, false);
    cpu.registers.set_flag(Flags::H, true);
}

/// 處理 RES 指令 (清除位元)
pub fn handle_res(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    if let Some(target) = last_operand(instruction) {
        let value = read8(cpu, memory, target, instruction);
        let result = value & !(1 << bit_index(instruction));
        write8(cpu, memory, target, instruction, result);
    }
}

/// 處理 SET 指令 (設定位元)
pub fn handle_set(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    if let Some(target) = last_operand(instruction) {
        let value = read8(cpu, memory, target, instruction);
        let result = value | (1 << bit_index(instruction));
        write8(cpu, memory, target, instruction, result);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::*;

    #[test]
    fn test_rlc_register() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_c(0x85);
        run_one(&mut cpu, &mut mem, &[0xCB, 0x01]); // RLC C
        assert_eq!(cpu.registers.get_c(), 0x0B);
        assert!(cpu.registers.flag(Flags::C));
        assert_eq!(cpu.registers.get_pc(), 2);
    }

    #[test]
    fn test_accumulator_rotates_clear_zero() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_a(0x00);
        cpu.registers.set_flag(Flags::Z, true);
        run_one(&mut cpu, &mut mem, &[0x07]); // RLCA
        assert!(!cpu.registers.flag(Flags::Z));

        cpu.registers.set_a(0x01);
        run_one(&mut cpu, &mut mem, &[0x1F]); // RRA
        assert_eq!(cpu.registers.get_a(), 0x00);
        assert!(cpu.registers.flag(Flags::C));
        assert!(!cpu.registers.flag(Flags::Z));

        run_one(&mut cpu, &mut mem, &[0x17]); // RLA，帶入進位
        assert_eq!(cpu.registers.get_a(), 0x01);
        assert!(!cpu.registers.flag(Flags::C));
    }

    #[test]
    fn test_shifts_and_swap() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_b(0x81);
        run_one(&mut cpu, &mut mem, &[0xCB, 0x28]); // SRA B
        assert_eq!(cpu.registers.get_b(), 0xC0);
        assert!(cpu.registers.flag(Flags::C));

        run_one(&mut cpu, &mut mem, &[0xCB, 0x38]); // SRL B
        assert_eq!(cpu.registers.get_b(), 0x60);
        assert!(!cpu.registers.flag(Flags::C));

        run_one(&mut cpu, &mut mem, &[0xCB, 0x20]); // SLA B
        assert_eq!(cpu.registers.get_b(), 0xC0);

        cpu.registers.set_a(0xF1);
        run_one(&mut cpu, &mut mem, &[0xCB, 0x37]); // SWAP A
        assert_eq!(cpu.registers.get_a(), 0x1F);
        assert_eq!(cpu.registers.get_f(), 0x00);
    }

    #[test]
    fn test_bit_res_set_on_memory() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_hl(0xC000);
        cpu.registers.set_flag(Flags::C, true);
        run_one(&mut cpu, &mut mem, &[0xCB, 0x7E]); // BIT 7,(HL)
        assert!(cpu.registers.flag(Flags::Z));
        assert!(cpu.registers.flag(Flags::H));
        assert!(cpu.registers.flag(Flags::C));

        run_one(&mut cpu, &mut mem, &[0xCB, 0xFE]); // SET 7,(HL)
        assert_eq!(mem.read_byte(0xC000), 0x80);
        run_one(&mut cpu, &mut mem, &[0xCB, 0x7E]);
        assert!(!cpu.registers.flag(Flags::Z));

        run_one(&mut cpu, &mut mem, &[0xCB, 0xBE]); // RES 7,(HL)
        assert_eq!(mem.read_byte(0xC000), 0x00);
    }
}
