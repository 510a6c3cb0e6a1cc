//! 增減指令的處理模組
//!
//! 8 位元形式設定 Z/N/H，C 不變；16 位元形式不影響旗標。

use super::{operand, read8, write8};
use crate::cpu::Cpu;
use crate::instruction::Instruction;
use crate::mmu::Memory;
use crate::opcodes::Operand;
use crate::registers::Flags;

/// 處理 INC 指令
pub fn handle_inc(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    match operand(instruction, 0) {
        Some(Operand::Reg16(pair)) => {
            let value = cpu.registers.get16(pair).wrapping_add(1);
            cpu.registers.set16(pair, value);
        }
        Some(target) => {
            let value = read8(cpu, memory, target, instruction);
            let result = value.wrapping_add(1);
            write8(cpu, memory, target, instruction, result);
            cpu.registers.set_flag(Flags::Z, result == 0);
            cpu.registers.set_flag(Flags::N, false);
            cpu.registers.set_flag(Flags::H, (value & 0x0F) == 0x0F);
        }
        None => {}
    }
}

/// 處理 DEC 指令
pub fn handle_dec(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    match operand(instruction, 0) {
        Some(Operand::Reg16(pair)) => {
            let value = cpu.registers.get16(pair).wrapping_sub(1);
            cpu.registers.set16(pair, value);
        }
        Some(target) => {
            let value = read8(cpu, memory, target, instruction);
            let result = value.wrapping_sub(1);
            write8(cpu, memory, target, instruction, result);
            cpu.registers.set_flag(Flags::Z, result == 0);
            cpu.registers.set_flag(Flags::N, true);
            cpu.registers.set_flag(Flags::H, (value & 0x0F) == 0x00);
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::*;
    use crate::mmu::Memory;
    use crate::registers::Flags;

    #[test]
    fn test_inc_dec_register() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_b(0x0F);
        cpu.registers.set_flag(Flags::C, true);
        run_one(&mut cpu, &mut mem, &[0x04]); // INC B
        assert_eq!(cpu.registers.get_b(), 0x10);
        assert!(cpu.registers.flag(Flags::H));
        assert!(cpu.registers.flag(Flags::C)); // 不受影響

        cpu.registers.set_b(0x01);
        run_one(&mut cpu, &mut mem, &[0x05]); // DEC B
        assert_eq!(cpu.registers.get_b(), 0x00);
        assert!(cpu.registers.flag(Flags::Z));
        assert!(cpu.registers.flag(Flags::N));
        assert!(!cpu.registers.flag(Flags::H));
    }

    #[test]
    fn test_inc_dec_memory_and_pairs() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_hl(0xC000);
        mem.write_byte(0xC000, 0xFF);
        run_one(&mut cpu, &mut mem, &[0x34]); // INC (HL)
        assert_eq!(mem.read_byte(0xC000), 0x00);
        assert!(cpu.registers.flag(Flags::Z));

        let before = cpu.registers.get_f();
        cpu.registers.set_de(0x0000);
        run_one(&mut cpu, &mut mem, &[0x1B]); // DEC DE
        assert_eq!(cpu.registers.get_de(), 0xFFFF);
        assert_eq!(cpu.registers.get_f(), before);
    }
}
