//! 堆疊指令的處理模組
//!
//! 這個模組負責處理 PUSH, POP 等堆疊操作指令

use super::operand;
use crate::cpu::Cpu;
use crate::instruction::Instruction;
use crate::mmu::Memory;
use crate::opcodes::Operand;

/// 處理 PUSH 指令
pub fn handle_push(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    if let Some(Operand::Reg16(pair)) = operand(instruction, 0) {
        let value = cpu.registers.get16(pair);
        cpu.push_word(memory, value);
    }
}

/// 處理 POP 指令 (POP AF 時 F 的低四位元被遮掉)
pub fn handle_pop(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    if let Some(Operand::Reg16(pair)) = operand(instruction, 0) {
        let value = cpu.pop_word(memory);
        cpu.registers.set16(pair, value);
    }
}
