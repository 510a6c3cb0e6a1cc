// 內建 LR35902 指令表
//
// 不規則的部分 (0x00-0x3F、0xC0-0xFF) 逐條列出；
// 規則的區塊 (LD r,r'、ALU r、INC/DEC r、CB 前綴) 依編碼位元欄位產生。

use super::{Catalog, Cond, Cycles, Descriptor, FlagEffects, Mnemonic, Opcode, Operand};
use crate::registers::{Reg8, Reg16};

use Mnemonic::*;
use Operand::{
    Addr16, HighAddr8, HighC, HlDec, HlInc, Imm8, Imm16, Indirect, Literal, Rel8, SpOffset, Vector,
};

const BC: Operand = Operand::Reg16(Reg16::BC);
const DE: Operand = Operand::Reg16(Reg16::DE);
const HL: Operand = Operand::Reg16(Reg16::HL);
const SP: Operand = Operand::Reg16(Reg16::SP);
const AF: Operand = Operand::Reg16(Reg16::AF);
const A: Operand = Operand::Reg8(Reg8::A);
const NZ: Operand = Operand::Cond(Cond::NZ);
const Z: Operand = Operand::Cond(Cond::Z);
const NC: Operand = Operand::Cond(Cond::NC);
const CY: Operand = Operand::Cond(Cond::C);

/// 非法 (未定義) 的無前綴操作碼
pub(crate) const ILLEGAL_OPCODES: [u8; 11] = [
    0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
];

/// 3 位元暫存器欄位：6 代表 (HL)
fn r8(bits: u8) -> Operand {
    match Reg8::from_bits(bits) {
        Some(reg) => Operand::Reg8(reg),
        None => Indirect(Reg16::HL),
    }
}

fn is_hl(bits: u8) -> bool {
    bits & 0x07 == 6
}

struct Builder {
    base: Vec<Option<Descriptor>>,
    cb: Vec<Option<Descriptor>>,
}

impl Builder {
    fn put(
        &mut self,
        opcode: Opcode,
        mnemonic: Mnemonic,
        ops: &[Operand],
        length: u8,
        cycles: impl Into<Cycles>,
        flags: &[u8; 4],
    ) {
        let desc = Descriptor {
            opcode,
            mnemonic,
            operands: [ops.first().copied(), ops.get(1).copied()],
            length,
            cycles: cycles.into(),
            flags: FlagEffects::from_pattern(flags),
        };
        debug_assert_eq!(desc.expected_length(), length, "{}", desc);
        let table = if opcode.is_extended() {
            &mut self.cb
        } else {
            &mut self.base
        };
        table[opcode.byte() as usize] = Some(desc);
    }

    fn op(
        &mut self,
        code: u8,
        mnemonic: Mnemonic,
        ops: &[Operand],
        length: u8,
        cycles: impl Into<Cycles>,
        flags: &[u8; 4],
    ) {
        self.put(Opcode::Base(code), mnemonic, ops, length, cycles, flags);
    }
}

pub(crate) fn build() -> Catalog {
    let mut b = Builder {
        base: vec![None; 256],
        cb: vec![None; 256],
    };

    // 0x00-0x3F
    b.op(0x00, Nop, &[], 1, 4, b"----");
    b.op(0x01, Ld, &[BC, Imm16], 3, 12, b"----");
    b.op(0x02, Ld, &[Indirect(Reg16::BC), A], 1, 8, b"----");
    b.op(0x03, Inc, &[BC], 1, 8, b"----");
    b.op(0x07, Rlca, &[], 1, 4, b"000C");
    b.op(0x08, Ld, &[Addr16, SP], 3, 20, b"----");
    b.op(0x09, Add, &[HL, BC], 1, 8, b"-0HC");
    b.op(0x0A, Ld, &[A, Indirect(Reg16::BC)], 1, 8, b"----");
    b.op(0x0B, Dec, &[BC], 1, 8, b"----");
    b.op(0x0F, Rrca, &[], 1, 4, b"000C");

    b.op(0x10, Stop, &[Literal(0)], 1, 4, b"----");
    b.op(0x11, Ld, &[DE, Imm16], 3, 12, b"----");
    b.op(0x12, Ld, &[Indirect(Reg16::DE), A], 1, 8, b"----");
    b.op(0x13, Inc, &[DE], 1, 8, b"----");
    b.op(0x17, Rla, &[], 1, 4, b"000C");
    b.op(0x18, Jr, &[Rel8], 2, 12, b"----");
    b.op(0x19, Add, &[HL, DE], 1, 8, b"-0HC");
    b.op(0x1A, Ld, &[A, Indirect(Reg16::DE)], 1, 8, b"----");
    b.op(0x1B, Dec, &[DE], 1, 8, b"----");
    b.op(0x1F, Rra, &[], 1, 4, b"000C");

    b.op(0x20, Jr, &[NZ, Rel8], 2, (12, 8), b"----");
    b.op(0x21, Ld, &[HL, Imm16], 3, 12, b"----");
    b.op(0x22, Ld, &[HlInc, A], 1, 8, b"----");
    b.op(0x23, Inc, &[HL], 1, 8, b"----");
    b.op(0x27, Daa, &[], 1, 4, b"Z-0C");
    b.op(0x28, Jr, &[Z, Rel8], 2, (12, 8), b"----");
    b.op(0x29, Add, &[HL, HL], 1, 8, b"-0HC");
    b.op(0x2A, Ld, &[A, HlInc], 1, 8, b"----");
    b.op(0x2B, Dec, &[HL], 1, 8, b"----");
    b.op(0x2F, Cpl, &[], 1, 4, b"-11-");

    b.op(0x30, Jr, &[NC, Rel8], 2, (12, 8), b"----");
    b.op(0x31, Ld, &[SP, Imm16], 3, 12, b"----");
    b.op(0x32, Ld, &[HlDec, A], 1, 8, b"----");
    b.op(0x33, Inc, &[SP], 1, 8, b"----");
    b.op(0x37, Scf, &[], 1, 4, b"-001");
    b.op(0x38, Jr, &[CY, Rel8], 2, (12, 8), b"----");
    b.op(0x39, Add, &[HL, SP], 1, 8, b"-0HC");
    b.op(0x3A, Ld, &[A, HlDec], 1, 8, b"----");
    b.op(0x3B, Dec, &[SP], 1, 8, b"----");
    b.op(0x3F, Ccf, &[], 1, 4, b"-00C");

    // INC r / DEC r / LD r,n8 (欄位 4、5、6)
    for bits in 0..8u8 {
        let base = bits << 3;
        let (inc_dec, ld) = if is_hl(bits) { (12, 12) } else { (4, 8) };
        b.op(base | 0x04, Inc, &[r8(bits)], 1, inc_dec, b"Z0H-");
        b.op(base | 0x05, Dec, &[r8(bits)], 1, inc_dec, b"Z1H-");
        b.op(base | 0x06, Ld, &[r8(bits), Imm8], 2, ld, b"----");
    }

    // LD r,r' (0x40-0x7F)，0x76 是 HALT
    for code in 0x40..=0x7Fu8 {
        if code == 0x76 {
            b.op(code, Halt, &[], 1, 4, b"----");
            continue;
        }
        let dst = (code >> 3) & 0x07;
        let src = code & 0x07;
        let cycles = if is_hl(dst) || is_hl(src) { 8 } else { 4 };
        b.op(code, Ld, &[r8(dst), r8(src)], 1, cycles, b"----");
    }

    // ALU A,r (0x80-0xBF)
    for code in 0x80..=0xBFu8 {
        let src = r8(code);
        let cycles = if is_hl(code) { 8 } else { 4 };
        match (code >> 3) & 0x07 {
            0 => b.op(code, Add, &[A, src], 1, cycles, b"Z0HC"),
            1 => b.op(code, Adc, &[A, src], 1, cycles, b"Z0HC"),
            2 => b.op(code, Sub, &[src], 1, cycles, b"Z1HC"),
            3 => b.op(code, Sbc, &[A, src], 1, cycles, b"Z1HC"),
            4 => b.op(code, And, &[src], 1, cycles, b"Z010"),
            5 => b.op(code, Xor, &[src], 1, cycles, b"Z000"),
            6 => b.op(code, Or, &[src], 1, cycles, b"Z000"),
            _ => b.op(code, Cp, &[src], 1, cycles, b"Z1HC"),
        }
    }

    // 0xC0-0xFF
    b.op(0xC0, Ret, &[NZ], 1, (20, 8), b"----");
    b.op(0xC1, Pop, &[BC], 1, 12, b"----");
    b.op(0xC2, Jp, &[NZ, Imm16], 3, (16, 12), b"----");
    b.op(0xC3, Jp, &[Imm16], 3, 16, b"----");
    b.op(0xC4, Call, &[NZ, Imm16], 3, (24, 12), b"----");
    b.op(0xC5, Push, &[BC], 1, 16, b"----");
    b.op(0xC6, Add, &[A, Imm8], 2, 8, b"Z0HC");
    b.op(0xC8, Ret, &[Z], 1, (20, 8), b"----");
    b.op(0xC9, Ret, &[], 1, 16, b"----");
    b.op(0xCA, Jp, &[Z, Imm16], 3, (16, 12), b"----");
    b.op(0xCB, Prefix, &[], 1, 4, b"----");
    b.op(0xCC, Call, &[Z, Imm16], 3, (24, 12), b"----");
    b.op(0xCD, Call, &[Imm16], 3, 24, b"----");
    b.op(0xCE, Adc, &[A, Imm8], 2, 8, b"Z0HC");

    b.op(0xD0, Ret, &[NC], 1, (20, 8), b"----");
    b.op(0xD1, Pop, &[DE], 1, 12, b"----");
    b.op(0xD2, Jp, &[NC, Imm16], 3, (16, 12), b"----");
    b.op(0xD4, Call, &[NC, Imm16], 3, (24, 12), b"----");
    b.op(0xD5, Push, &[DE], 1, 16, b"----");
    b.op(0xD6, Sub, &[Imm8], 2, 8, b"Z1HC");
    b.op(0xD8, Ret, &[CY], 1, (20, 8), b"----");
    b.op(0xD9, Reti, &[], 1, 16, b"----");
    b.op(0xDA, Jp, &[CY, Imm16], 3, (16, 12), b"----");
    b.op(0xDC, Call, &[CY, Imm16], 3, (24, 12), b"----");
    b.op(0xDE, Sbc, &[A, Imm8], 2, 8, b"Z1HC");

    b.op(0xE0, Ldh, &[HighAddr8, A], 2, 12, b"----");
    b.op(0xE1, Pop, &[HL], 1, 12, b"----");
    b.op(0xE2, Ldh, &[HighC, A], 1, 8, b"----");
    b.op(0xE5, Push, &[HL], 1, 16, b"----");
    b.op(0xE6, And, &[Imm8], 2, 8, b"Z010");
    b.op(0xE8, Add, &[SP, Rel8], 2, 16, b"00HC");
    b.op(0xE9, Jp, &[HL], 1, 4, b"----");
    b.op(0xEA, Ld, &[Addr16, A], 3, 16, b"----");
    b.op(0xEE, Xor, &[Imm8], 2, 8, b"Z000");

    b.op(0xF0, Ldh, &[A, HighAddr8], 2, 12, b"----");
    b.op(0xF1, Pop, &[AF], 1, 12, b"ZNHC");
    b.op(0xF2, Ldh, &[A, HighC], 1, 8, b"----");
    b.op(0xF3, Di, &[], 1, 4, b"----");
    b.op(0xF5, Push, &[AF], 1, 16, b"----");
    b.op(0xF6, Or, &[Imm8], 2, 8, b"Z000");
    b.op(0xF8, Ld, &[HL, SpOffset], 2, 12, b"00HC");
    b.op(0xF9, Ld, &[SP, HL], 1, 8, b"----");
    b.op(0xFA, Ld, &[A, Addr16], 3, 16, b"----");
    b.op(0xFB, Ei, &[], 1, 4, b"----");
    b.op(0xFE, Cp, &[Imm8], 2, 8, b"Z1HC");

    // RST (0xC7, 0xCF, ... 0xFF)
    for n in 0..8u8 {
        b.op(0xC7 | (n << 3), Rst, &[Vector(n << 3)], 1, 16, b"----");
    }

    for code in ILLEGAL_OPCODES {
        b.op(code, Illegal, &[], 1, 4, b"----");
    }

    // CB 前綴：高兩位元選族群，中間三位元選操作或位元，低三位元選暫存器
    for code in 0..=0xFFu8 {
        let reg = r8(code);
        let hl = is_hl(code);
        let opcode = Opcode::Extended(code);
        let y = (code >> 3) & 0x07;
        match code >> 6 {
            0 => {
                let mnemonic = [Rlc, Rrc, Rl, Rr, Sla, Sra, Swap, Srl][y as usize];
                let flags = if mnemonic == Swap { b"Z000" } else { b"Z00C" };
                b.put(opcode, mnemonic, &[reg], 2, if hl { 16 } else { 8 }, flags);
            }
            1 => b.put(
                opcode,
                Bit,
                &[Operand::Bit(y), reg],
                2,
                if hl { 12 } else { 8 },
                b"Z01-",
            ),
            2 => b.put(
                opcode,
                Res,
                &[Operand::Bit(y), reg],
                2,
                if hl { 16 } else { 8 },
                b"----",
            ),
            _ => b.put(
                opcode,
                Set,
                &[Operand::Bit(y), reg],
                2,
                if hl { 16 } else { 8 },
                b"----",
            ),
        }
    }

    Catalog::from_tables(b.base, b.cb)
}
