//! 算術指令的處理模組
//!
//! 包含 ADD, ADC, SUB, SBC, AND, OR, XOR, CP 等指令

use super::{last_operand, operand, read8};
use crate::cpu::Cpu;
use crate::instruction::Instruction;
use crate::mmu::Memory;
use crate::opcodes::Operand;
use crate::registers::{Flags, Reg16};

/// 8 位元來源值：`ADD A,r` 的第二個運算元或 `SUB r` 的唯一運算元
fn source(cpu: &mut Cpu, memory: &dyn Memory, instruction: &Instruction) -> u8 {
    match last_operand(instruction) {
        Some(op) => read8(cpu, memory, op, instruction),
        None => 0,
    }
}

/// A + value (+ carry)，設定 Z0HC
pub(crate) fn add8(cpu: &mut Cpu, value: u8, carry: bool) {
    let a = cpu.registers.get_a();
    let c = carry as u8;
    let result = a as u16 + value as u16 + c as u16;
    cpu.registers.set_a(result as u8);
    cpu.registers.update_flags(
        result as u8 == 0,
        false,
        (a & 0x0F) + (value & 0x0F) + c > 0x0F,
        result > 0xFF,
    );
}

/// A - value (- carry)，設定 Z1HC；`store` 為 false 時只比較 (CP)
pub(crate) fn sub8(cpu: &mut Cpu, value: u8, carry: bool, store: bool) {
    let a = cpu.registers.get_a();
    let c = carry as u8;
    let result = a.wrapping_sub(value).wrapping_sub(c);
    cpu.registers.update_flags(
        result == 0,
        true,
        (a & 0x0F) < (value & 0x0F) + c,
        (a as u16) < value as u16 + c as u16,
    );
    if store {
        cpu.registers.set_a(result);
    }
}

/// SP + e8，供 `ADD SP,e8` 與 `LD HL,SP+e8` 共用，設定 00HC
///
/// H 與 C 取自低位元組的無號加法。
pub(crate) fn sp_offset(cpu: &mut Cpu, offset: i8) -> u16 {
    let sp = cpu.registers.get_sp();
    let byte = offset as u8 as u16;
    cpu.registers.update_flags(
        false,
        false,
        (sp & 0x0F) + (byte & 0x0F) > 0x0F,
        (sp & 0xFF) + byte > 0xFF,
    );
    sp.wrapping_add_signed(offset as i16)
}

/// 處理 ADD 指令
pub fn handle_add(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    match operand(instruction, 0) {
        Some(Operand::Reg16(Reg16::HL)) => {
            // ADD HL,rr - Z 不受影響
            let hl = cpu.registers.get_hl();
            let value = match operand(instruction, 1) {
                Some(Operand::Reg16(pair)) => cpu.registers.get16(pair),
                _ => 0,
            };
            let result = hl as u32 + value as u32;
            cpu.registers.set_hl(result as u16);
            cpu.registers.set_flag(Flags::N, false);
            cpu.registers
                .set_flag(Flags::H, (hl & 0x0FFF) + (value & 0x0FFF) > 0x0FFF);
            cpu.registers.set_flag(Flags::C, result > 0xFFFF);
        }
        Some(Operand::Reg16(Reg16::SP)) => {
            let sp = sp_offset(cpu, instruction.offset());
            cpu.registers.set_sp(sp);
        }
        _ => {
            let value = source(cpu, memory, instruction);
            add8(cpu, value, false);
        }
    }
}

/// 處理 ADC (帶進位加法) 指令
pub fn handle_adc(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let value = source(cpu, memory, instruction);
    let carry = cpu.registers.flag(Flags::C);
    add8(cpu, value, carry);
}

/// 處理 SUB (減法) 指令
pub fn handle_sub(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let value = source(cpu, memory, instruction);
    sub8(cpu, value, false, true);
}

/// 處理 SBC (帶借位減法) 指令
pub fn handle_sbc(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let value = source(cpu, memory, instruction);
    let carry = cpu.registers.flag(Flags::C);
    sub8(cpu, value, carry, true);
}

/// 處理 CP (比較) 指令
pub fn handle_cp(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let value = source(cpu, memory, instruction);
    sub8(cpu, value, false, false);
}

pub fn handle_and(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let value = source(cpu, memory, instruction);
    let result = cpu.registers.get_a() & value;
    cpu.registers.set_a(result);
    cpu.registers.update_flags(result == 0, false, true, false);
}

pub fn handle_or(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let value = source(cpu, memory, instruction);
    let result = cpu.registers.get_a() | value;
    cpu.registers.set_a(result);
    cpu.registers.update_flags(result == 0, false, false, false);
}

pub fn handle_xor(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let value = source(cpu, memory, instruction);
    let result = cpu.registers.get_a() ^ value;
    cpu.registers.set_a(result);
    cpu.registers.update_flags(result == 0, false, false, false);
}
