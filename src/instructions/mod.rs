//! 指令處理模組
//!
//! 依助記符分派到各指令族群的處理器。處理器直接設定旗標，
//! 控制轉移類指令 (JP/JR/CALL/RET/RETI/RST) 自行設定 PC。

pub mod arithmetic;
pub mod control;
pub mod inc_dec;
pub mod jump;
pub mod ld;
pub mod misc;
pub mod rotate;
pub mod stack;

use log::warn;

use crate::cpu::Cpu;
use crate::instruction::Instruction;
use crate::mmu::Memory;
use crate::opcodes::{Mnemonic, Operand};

/// 主要的指令處理器
pub fn execute(cpu: &mut Cpu, memory: &mut dyn Memory, instruction: &Instruction) {
    match instruction.mnemonic() {
        // 載入指令
        Mnemonic::Ld => ld::handle_ld(cpu, memory, instruction),
        Mnemonic::Ldh => misc::handle_ldh(cpu, memory, instruction),

        // 算術指令
        Mnemonic::Add => arithmetic::handle_add(cpu, memory, instruction),
        Mnemonic::Adc => arithmetic::handle_adc(cpu, memory, instruction),
        Mnemonic::Sub => arithmetic::handle_sub(cpu, memory, instruction),
        Mnemonic::Sbc => arithmetic::handle_sbc(cpu, memory, instruction),
        Mnemonic::And => arithmetic::handle_and(cpu, memory, instruction),
        Mnemonic::Or => arithmetic::handle_or(cpu, memory, instruction),
        Mnemonic::Xor => arithmetic::handle_xor(cpu, memory, instruction),
        Mnemonic::Cp => arithmetic::handle_cp(cpu, memory, instruction),

        // 增減指令
        Mnemonic::Inc => inc_dec::handle_inc(cpu, memory, instruction),
        Mnemonic::Dec => inc_dec::handle_dec(cpu, memory, instruction),

        // 跳轉指令
        Mnemonic::Jp => jump::handle_jp(cpu, instruction),
        Mnemonic::Jr => jump::handle_jr(cpu, instruction),
        Mnemonic::Call => jump::handle_call(cpu, memory, instruction),
        Mnemonic::Ret => jump::handle_ret(cpu, memory, instruction),
        Mnemonic::Reti => jump::handle_reti(cpu, memory, instruction),
        Mnemonic::Rst => jump::handle_rst(cpu, memory, instruction),

        // 堆疊指令
        Mnemonic::Push => stack::handle_push(cpu, memory, instruction),
        Mnemonic::Pop => stack::handle_pop(cpu, memory, instruction),

        // 累加器旋轉
        Mnemonic::Rlca | Mnemonic::Rrca | Mnemonic::Rla | Mnemonic::Rra => {
            rotate::handle_rotate_a(cpu, instruction)
        }

        // CB 前綴：旋轉、移位與位元操作
        Mnemonic::Rlc
        | Mnemonic::Rrc
        | Mnemonic::Rl
        | Mnemonic::Rr
        | Mnemonic::Sla
        | Mnemonic::Sra
        | Mnemonic::Swap
        | Mnemonic::Srl => rotate::handle_shift(cpu, memory, instruction),
        Mnemonic::Bit => rotate::handle_bit(cpu, memory, instruction),
        Mnemonic::Res => rotate::handle_res(cpu, memory, instruction),
        Mnemonic::Set => rotate::handle_set(cpu, memory, instruction),

        // 雜項指令
        Mnemonic::Daa => misc::handle_daa(cpu),
        Mnemonic::Cpl => misc::handle_cpl(cpu),
        Mnemonic::Scf => misc::handle_scf(cpu),
        Mnemonic::Ccf => misc::handle_ccf(cpu),

        // 控制指令
        Mnemonic::Nop => control::handle_nop(cpu),
        Mnemonic::Stop => control::handle_stop(cpu),
        Mnemonic::Halt => control::handle_halt(cpu),
        Mnemonic::Di => control::handle_di(cpu),
        Mnemonic::Ei => control::handle_ei(cpu),

        // 引擎在執行前就會拒絕非法指令；前綴本身不會被解碼成指令
        Mnemonic::Prefix | Mnemonic::Illegal => {}
    }
}

/// 讀取 8 位元運算元
///
/// (HL+) / (HL-) 在存取後調整 HL。
pub(crate) fn read8(
    cpu: &mut Cpu,
    memory: &dyn Memory,
    operand: Operand,
    instruction: &Instruction,
) -> u8 {
    let regs = &mut cpu.registers;
    match operand {
        Operand::Reg8(reg) => regs.get(reg),
        Operand::Indirect(pair) => memory.read_byte(regs.get16(pair)),
        Operand::HlInc => {
            let hl = regs.get_hl();
            regs.set_hl(hl.wrapping_add(1));
            memory.read_byte(hl)
        }
        Operand::HlDec => {
            let hl = regs.get_hl();
            regs.set_hl(hl.wrapping_sub(1));
            memory.read_byte(hl)
        }
        Operand::HighC => memory.read_byte(high_page(regs.get_c())),
        Operand::Imm8 => instruction.imm8(),
        Operand::HighAddr8 => memory.read_byte(high_page(instruction.imm8())),
        Operand::Addr16 => memory.read_byte(instruction.imm16()),
        other => {
            warn!("{}: operand {} is not an 8-bit source", instruction, other);
            0
        }
    }
}

/// 寫入 8 位元運算元
pub(crate) fn write8(
    cpu: &mut Cpu,
    memory: &mut dyn Memory,
    operand: Operand,
    instruction: &Instruction,
    value: u8,
) {
    let regs = &mut cpu.registers;
    match operand {
        Operand::Reg8(reg) => regs.set(reg, value),
        Operand::Indirect(pair) => memory.write_byte(regs.get16(pair), value),
        Operand::HlInc => {
            let hl = regs.get_hl();
            regs.set_hl(hl.wrapping_add(1));
            memory.write_byte(hl, value);
        }
        Operand::HlDec => {
            let hl = regs.get_hl();
            regs.set_hl(hl.wrapping_sub(1));
            memory.write_byte(hl, value);
        }
        Operand::HighC => memory.write_byte(high_page(regs.get_c()), value),
        Operand::HighAddr8 => memory.write_byte(high_page(instruction.imm8()), value),
        Operand::Addr16 => memory.write_byte(instruction.imm16(), value),
        other => warn!("{}: operand {} is not an 8-bit destination", instruction, other),
    }
}

fn high_page(offset: u8) -> u16 {
    0xFF00 | offset as u16
}

/// 指令的第 `index` 個語法運算元
pub(crate) fn operand(instruction: &Instruction, index: usize) -> Option<Operand> {
    instruction.descriptor().operands.get(index).copied().flatten()
}

/// 最後一個語法運算元 (單運算元形式與 `A,src` 形式的來源)
pub(crate) fn last_operand(instruction: &Instruction) -> Option<Operand> {
    instruction.descriptor().operands().last()
}


#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;

    #[test]
    fn test_hl_increment_and_decrement() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_hl(0xC000);
        cpu.registers.set_a(0x42);
        run_one(&mut cpu, &mut mem, &[0x22]); // LD (HL+),A
        assert_eq!(mem.read_byte(0xC000), 0x42);
        assert_eq!(cpu.registers.get_hl(), 0xC001);

        mem.write_byte(0xC001, 0x99);
        run_one(&mut cpu, &mut mem, &[0x3A]); // LD A,(HL-)
        assert_eq!(cpu.registers.get_a(), 0x99);
        assert_eq!(cpu.registers.get_hl(), 0xC000);
    }

    #[test]
    fn test_high_page_access() {
        let (mut cpu, mut mem) = setup();
        cpu.registers.set_a(0x77);
        run_one(&mut cpu, &mut mem, &[0xE0, 0x44]); // LDH (a8),A
        assert_eq!(mem.read_byte(0xFF44), 0x77);

        cpu.registers.set_c(0x44);
        cpu.registers.set_a(0);
        run_one(&mut cpu, &mut mem, &[0xF2]); // LDH A,(C)
        assert_eq!(cpu.registers.get_a(), 0x77);
    }
}
