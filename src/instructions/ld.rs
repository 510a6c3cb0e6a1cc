//! 載入指令的處理模組
//!
//! LD 的所有形式：暫存器之間、暫存器與記憶體、立即值、16 位元載入、
//! `LD (a16),SP` 與 `LD HL,SP+e8`。除了最後一種之外都不影響旗標。

use super::arithmetic::sp_offset;
use super::{operand, read8, write8};
use crate::cpu::Cpu;
use crate::instruction::Instruction;
use crate::mmu::Memory;
use crate::opcodes::Operand;

/// 處理 LD 指令
pub fn handle_ld(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let (Some(dst), Some(src)) = (operand(instruction, 0), operand(instruction, 1)) else {
        return;
    };

    match (dst, src) {
        // LD rr,n16
        (Operand::Reg16(pair), Operand::Imm16) => {
            cpu.registers.set16(pair, instruction.imm16());
        }
        // LD SP,HL
        (Operand::Reg16(pair), Operand::Reg16(from)) => {
            let value = cpu.registers.get16(from);
            cpu.registers.set16(pair, value);
        }
        // LD HL,SP+e8
        (Operand::Reg16(pair), Operand::SpOffset) => {
            let value = sp_offset(cpu, instruction.offset());
            cpu.registers.set16(pair, value);
        }
        // LD (a16),SP
        (Operand::Addr16, Operand::Reg16(from)) => {
            let value = cpu.registers.get16(from);
            memory.write_word(instruction.imm16(), value);
        }
        _ => {
            let value = read8(cpu, memory, src, instruction);
            write8(cpu, memory, dst, instruction, value);
        }
    }
}
