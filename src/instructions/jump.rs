//! 跳轉和控制流指令的處理模組
//!
//! 這些指令自行設定 PC：分支成立時跳到目標，不成立時跳到下一條指令。

use super::operand;
use crate::cpu::{Cpu, InterruptMasterState};
use crate::instruction::Instruction;
use crate::mmu::Memory;
use crate::opcodes::Operand;

/// 沒有條件，或條件對目前旗標成立
fn condition_holds(cpu: &Cpu, instruction: &Instruction) -> bool {
    instruction
        .descriptor()
        .condition()
        .is_none_or(|cond| cond.holds(cpu.registers.flags()))
}

fn fall_through(cpu: &mut Cpu, instruction: &Instruction) {
    let next = cpu.next_pc(instruction);
    cpu.registers.set_pc(next);
}

/// 處理 JP 指令
pub fn handle_jp(cpu: &mut Cpu, instruction: &Instruction) {
    if !condition_holds(cpu, instruction) {
        fall_through(cpu, instruction);
        return;
    }
    let target = match operand(instruction, 0) {
        // JP HL
        Some(Operand::Reg16(pair)) => cpu.registers.get16(pair),
        _ => instruction.imm16(),
    };
    cpu.jump(target);
}

/// 處理 JR 指令 (相對跳轉，位移自下一條指令起算)
pub fn handle_jr(cpu: &mut Cpu, instruction: &Instruction) {
    if !condition_holds(cpu, instruction) {
        fall_through(cpu, instruction);
        return;
    }
    let target = cpu
        .next_pc(instruction)
        .wrapping_add_signed(instruction.offset() as i16);
    cpu.jump(target);
}

/// 處理 CALL 指令
pub fn handle_call(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    if !condition_holds(cpu, instruction) {
        fall_through(cpu, instruction);
        return;
    }
    let ret = cpu.next_pc(instruction);
    cpu.push_word(memory, ret);
    cpu.jump(instruction.imm16());
}

/// 處理 RET 指令
pub fn handle_ret(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    if !condition_holds(cpu, instruction) {
        fall_through(cpu, instruction);
        return;
    }
    let target = cpu.pop_word(memory);
    cpu.jump(target);
}

/// 處理 RETI 指令：返回並立即啟用中斷
pub fn handle_reti(cpu: &mut Cpu, memory: &mut dyn Memory, _instruction: &Instruction) {
    let target = cpu.pop_word(memory);
    cpu.jump(target);
    cpu.ime = InterruptMasterState::Enabled;
}

/// 處理 RST 指令：推入返回位址後跳到固定向量
pub fn handle_rst(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    let vector = match operand(instruction, 0) {
        Some(Operand::Vector(v)) => v as u16,
        _ => 0,
    };
    let ret = cpu.next_pc(instruction);
    cpu.push_word(memory, ret);
    cpu.jump(vector);
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use super::*;
    use crate::registers::Flags;

    #[test]
    fn test_jp_conditional() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_pc(0x0100);
        run_one(&mut cpu, &mut mem, &[0xCA, 0x00, 0x20]); // JP Z,2000
        assert_eq!(cpu.registers.get_pc(), 0x0103);
        assert!(!cpu.branch_taken);

        cpu.registers.set_flag(Flags::Z, true);
        run_one(&mut cpu, &mut mem, &[0xCA, 0x00, 0x20]);
        assert_eq!(cpu.registers.get_pc(), 0x2000);
        assert!(cpu.branch_taken);
    }

    #[test]
    fn test_jp_hl() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_hl(0x4321);
        run_one(&mut cpu, &mut mem, &[0xE9]);
        assert_eq!(cpu.registers.get_pc(), 0x4321);
    }

    #[test]
    fn test_jr_backwards_and_forwards() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_pc(0x0200);
        run_one(&mut cpu, &mut mem, &[0x18, 0xFE]); // JR -2
        assert_eq!(cpu.registers.get_pc(), 0x0200);
        run_one(&mut cpu, &mut mem, &[0x18, 0x10]); // JR +16
        assert_eq!(cpu.registers.get_pc(), 0x0212);
    }

    #[test]
    fn test_call_ret_and_rst() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_pc(0x0150);
        run_one(&mut cpu, &mut mem, &[0xCD, 0x00, 0x40]); // CALL 4000
        assert_eq!(cpu.registers.get_pc(), 0x4000);
        assert_eq!(cpu.registers.get_sp(), 0xFFFC);
        assert_eq!(mem.read_word(0xFFFC), 0x0153);

        run_one(&mut cpu, &mut mem, &[0xFF]); // RST 38
        assert_eq!(cpu.registers.get_pc(), 0x0038);
        assert_eq!(mem.read_word(0xFFFA), 0x4001);

        run_one(&mut cpu, &mut mem, &[0xC9]); // RET
        assert_eq!(cpu.registers.get_pc(), 0x4001);
        run_one(&mut cpu, &mut mem, &[0xD9]); // RETI
        assert_eq!(cpu.registers.get_pc(), 0x0153);
        assert_eq!(cpu.registers.get_sp(), 0xFFFE);
        assert_eq!(cpu.ime, InterruptMasterState::Enabled);
    }

    #[test]
    fn test_ret_not_taken_falls_through() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_pc(0x0300);
        cpu.registers.set_flag(Flags::Z, true);
        run_one(&mut cpu, &mut mem, &[0xC0]); // RET NZ
        assert_eq!(cpu.registers.get_pc(), 0x0301);
        assert_eq!(cpu.registers.get_sp(), 0xFFFE);
    }
}
