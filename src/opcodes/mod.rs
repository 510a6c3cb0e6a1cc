//! 指令目錄 (opcode catalog)
//!
//! 兩張 256 格的表：無前綴 (unprefixed) 與 0xCB 前綴 (cbprefixed)。
//! 每格是一個不可變的 [`Descriptor`]，或是明確的空洞 (`None`)。
//! 目錄只在啟動時建立一次，之後只讀，查詢為 O(1) 陣列索引。

mod json;
mod table;

use std::fmt;
use std::str::FromStr;

use crate::registers::{Flags, Reg8, Reg16};

/// 擴充指令空間的前綴位元組
pub const PREFIX_CB: u8 = 0xCB;

/// 操作碼選擇子：單一位元組，或 0xCB 前綴加一個位元組
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Opcode {
    Base(u8),
    Extended(u8),
}

impl Opcode {
    pub fn byte(self) -> u8 {
        match self {
            Opcode::Base(b) | Opcode::Extended(b) => b,
        }
    }

    pub fn is_extended(self) -> bool {
        matches!(self, Opcode::Extended(_))
    }

    /// 選擇子本身佔用的位元組數 (含前綴)
    pub fn selector_len(self) -> u8 {
        if self.is_extended() { 2 } else { 1 }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Base(b) => write!(f, "0x{:02X}", b),
            Opcode::Extended(b) => write!(f, "0x{:02X} 0x{:02X}", PREFIX_CB, b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Nop,
    Ld,
    Ldh,
    Inc,
    Dec,
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,
    Jr,
    Jp,
    Call,
    Ret,
    Reti,
    Rst,
    Push,
    Pop,
    Halt,
    Stop,
    Di,
    Ei,
    Prefix,
    Illegal,
    // CB 前綴
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
    Bit,
    Res,
    Set,
}

impl Mnemonic {
    pub fn name(self) -> &'static str {
        match self {
            Mnemonic::Nop => "NOP",
            Mnemonic::Ld => "LD",
            Mnemonic::Ldh => "LDH",
            Mnemonic::Inc => "INC",
            Mnemonic::Dec => "DEC",
            Mnemonic::Add => "ADD",
            Mnemonic::Adc => "ADC",
            Mnemonic::Sub => "SUB",
            Mnemonic::Sbc => "SBC",
            Mnemonic::And => "AND",
            Mnemonic::Xor => "XOR",
            Mnemonic::Or => "OR",
            Mnemonic::Cp => "CP",
            Mnemonic::Rlca => "RLCA",
            Mnemonic::Rrca => "RRCA",
            Mnemonic::Rla => "RLA",
            Mnemonic::Rra => "RRA",
            Mnemonic::Daa => "DAA",
            Mnemonic::Cpl => "CPL",
            Mnemonic::Scf => "SCF",
            Mnemonic::Ccf => "CCF",
            Mnemonic::Jr => "JR",
            Mnemonic::Jp => "JP",
            Mnemonic::Call => "CALL",
            Mnemonic::Ret => "RET",
            Mnemonic::Reti => "RETI",
            Mnemonic::Rst => "RST",
            Mnemonic::Push => "PUSH",
            Mnemonic::Pop => "POP",
            Mnemonic::Halt => "HALT",
            Mnemonic::Stop => "STOP",
            Mnemonic::Di => "DI",
            Mnemonic::Ei => "EI",
            Mnemonic::Prefix => "PREFIX",
            Mnemonic::Illegal => "ILLEGAL",
            Mnemonic::Rlc => "RLC",
            Mnemonic::Rrc => "RRC",
            Mnemonic::Rl => "RL",
            Mnemonic::Rr => "RR",
            Mnemonic::Sla => "SLA",
            Mnemonic::Sra => "SRA",
            Mnemonic::Swap => "SWAP",
            Mnemonic::Srl => "SRL",
            Mnemonic::Bit => "BIT",
            Mnemonic::Res => "RES",
            Mnemonic::Set => "SET",
        }
    }

    /// 由指令自行設定 PC 的控制轉移類指令
    pub fn is_control_transfer(self) -> bool {
        matches!(
            self,
            Mnemonic::Jp
                | Mnemonic::Jr
                | Mnemonic::Call
                | Mnemonic::Ret
                | Mnemonic::Reti
                | Mnemonic::Rst
        )
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Mnemonic {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 描述檔裡的非法指令寫成 ILLEGAL_D3 之類
        if s.starts_with("ILLEGAL") {
            return Ok(Mnemonic::Illegal);
        }
        let m = match s {
            "NOP" => Mnemonic::Nop,
            "LD" => Mnemonic::Ld,
            "LDH" => Mnemonic::Ldh,
            "INC" => Mnemonic::Inc,
            "DEC" => Mnemonic::Dec,
            "ADD" => Mnemonic::Add,
            "ADC" => Mnemonic::Adc,
            "SUB" => Mnemonic::Sub,
            "SBC" => Mnemonic::Sbc,
            "AND" => Mnemonic::And,
            "XOR" => Mnemonic::Xor,
            "OR" => Mnemonic::Or,
            "CP" => Mnemonic::Cp,
            "RLCA" => Mnemonic::Rlca,
            "RRCA" => Mnemonic::Rrca,
            "RLA" => Mnemonic::Rla,
            "RRA" => Mnemonic::Rra,
            "DAA" => Mnemonic::Daa,
            "CPL" => Mnemonic::Cpl,
            "SCF" => Mnemonic::Scf,
            "CCF" => Mnemonic::Ccf,
            "JR" => Mnemonic::Jr,
            "JP" => Mnemonic::Jp,
            "CALL" => Mnemonic::Call,
            "RET" => Mnemonic::Ret,
            "RETI" => Mnemonic::Reti,
            "RST" => Mnemonic::Rst,
            "PUSH" => Mnemonic::Push,
            "POP" => Mnemonic::Pop,
            "HALT" => Mnemonic::Halt,
            "STOP" => Mnemonic::Stop,
            "DI" => Mnemonic::Di,
            "EI" => Mnemonic::Ei,
            "PREFIX" => Mnemonic::Prefix,
            "RLC" => Mnemonic::Rlc,
            "RRC" => Mnemonic::Rrc,
            "RL" => Mnemonic::Rl,
            "RR" => Mnemonic::Rr,
            "SLA" => Mnemonic::Sla,
            "SRA" => Mnemonic::Sra,
            "SWAP" => Mnemonic::Swap,
            "SRL" => Mnemonic::Srl,
            "BIT" => Mnemonic::Bit,
            "RES" => Mnemonic::Res,
            "SET" => Mnemonic::Set,
            _ => return Err(()),
        };
        Ok(m)
    }
}

/// 跳躍條件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cond {
    NZ,
    Z,
    NC,
    C,
}

impl Cond {
    pub fn name(self) -> &'static str {
        match self {
            Cond::NZ => "NZ",
            Cond::Z => "Z",
            Cond::NC => "NC",
            Cond::C => "C",
        }
    }

    /// 以旗標位元測試條件是否成立
    pub fn holds(self, flags: Flags) -> bool {
        match self {
            Cond::NZ => !flags.contains(Flags::Z),
            Cond::Z => flags.contains(Flags::Z),
            Cond::NC => !flags.contains(Flags::C),
            Cond::C => flags.contains(Flags::C),
        }
    }
}

impl FromStr for Cond {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NZ" => Ok(Cond::NZ),
            "Z" => Ok(Cond::Z),
            "NC" => Ok(Cond::NC),
            "C" => Ok(Cond::C),
            _ => Err(()),
        }
    }
}

/// 立即值在指令編碼中的寬度與正負號
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImmediateKind {
    /// 1 位元組無號
    U8,
    /// 1 位元組二補數
    I8,
    /// 2 位元組，小端序
    U16,
}

impl ImmediateKind {
    pub fn width(self) -> u8 {
        match self {
            ImmediateKind::U8 | ImmediateKind::I8 => 1,
            ImmediateKind::U16 => 2,
        }
    }

    pub fn is_signed(self) -> bool {
        self == ImmediateKind::I8
    }
}

/// 指令語法上的運算元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Reg8(Reg8),
    Reg16(Reg16),
    /// (BC) (DE) (HL)
    Indirect(Reg16),
    /// (HL+)
    HlInc,
    /// (HL-)
    HlDec,
    /// (C)，即 0xFF00 + C
    HighC,
    /// n8
    Imm8,
    /// n16 / a16
    Imm16,
    /// e8，有號相對位移
    Rel8,
    /// (a16)
    Addr16,
    /// (a8)，即 0xFF00 + a8
    HighAddr8,
    /// SP+e8
    SpOffset,
    Cond(Cond),
    /// BIT/RES/SET 的位元索引，編在選擇子裡
    Bit(u8),
    /// RST 目標位址
    Vector(u8),
    /// 固定常數 (STOP 0)
    Literal(u8),
}

impl Operand {
    /// 此運算元是否需要從指令流讀取額外位元組
    pub fn immediate(self) -> Option<ImmediateKind> {
        match self {
            Operand::Imm8 | Operand::HighAddr8 => Some(ImmediateKind::U8),
            Operand::Rel8 | Operand::SpOffset => Some(ImmediateKind::I8),
            Operand::Imm16 | Operand::Addr16 => Some(ImmediateKind::U16),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg8(r) => write!(f, "{}", r),
            Operand::Reg16(r) => write!(f, "{}", r),
            Operand::Indirect(r) => write!(f, "({})", r),
            Operand::HlInc => f.write_str("(HL+)"),
            Operand::HlDec => f.write_str("(HL-)"),
            Operand::HighC => f.write_str("(C)"),
            Operand::Imm8 => f.write_str("n8"),
            Operand::Imm16 => f.write_str("n16"),
            Operand::Rel8 => f.write_str("e8"),
            Operand::Addr16 => f.write_str("(a16)"),
            Operand::HighAddr8 => f.write_str("(a8)"),
            Operand::SpOffset => f.write_str("SP+e8"),
            Operand::Cond(c) => f.write_str(c.name()),
            Operand::Bit(b) => write!(f, "{}", b),
            Operand::Vector(v) => write!(f, "{:02X}", v),
            Operand::Literal(v) => write!(f, "{:X}", v),
        }
    }
}

/// 週期數：條件分支成立 / 不成立各自的成本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cycles {
    pub taken: u8,
    pub not_taken: u8,
}

impl Cycles {
    pub const fn fixed(cycles: u8) -> Self {
        Cycles {
            taken: cycles,
            not_taken: cycles,
        }
    }

    pub const fn branch(taken: u8, not_taken: u8) -> Self {
        Cycles { taken, not_taken }
    }

    pub fn is_conditional(&self) -> bool {
        self.taken != self.not_taken
    }

    pub fn for_branch(&self, taken: bool) -> u8 {
        if taken { self.taken } else { self.not_taken }
    }
}

impl From<u8> for Cycles {
    fn from(cycles: u8) -> Self {
        Cycles::fixed(cycles)
    }
}

impl From<(u8, u8)> for Cycles {
    fn from((taken, not_taken): (u8, u8)) -> Self {
        Cycles::branch(taken, not_taken)
    }
}

/// 單一旗標受指令影響的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagEffect {
    /// `-`
    Unaffected,
    /// `0`
    Reset,
    /// `1`
    Set,
    /// 依運算結果而定
    Computed,
}

impl FlagEffect {
    const fn from_byte(c: u8) -> Self {
        match c {
            b'-' => FlagEffect::Unaffected,
            b'0' => FlagEffect::Reset,
            b'1' => FlagEffect::Set,
            _ => FlagEffect::Computed,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "-" => Some(FlagEffect::Unaffected),
            "0" => Some(FlagEffect::Reset),
            "1" => Some(FlagEffect::Set),
            "Z" | "N" | "H" | "C" => Some(FlagEffect::Computed),
            _ => None,
        }
    }
}

/// Z N H C 四個旗標的影響
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlagEffects {
    pub z: FlagEffect,
    pub n: FlagEffect,
    pub h: FlagEffect,
    pub c: FlagEffect,
}

impl FlagEffects {
    pub const NONE: FlagEffects = FlagEffects::from_pattern(b"----");

    /// 由四字元樣式建立，例如 `b"Z0HC"`
    pub const fn from_pattern(p: &[u8; 4]) -> Self {
        FlagEffects {
            z: FlagEffect::from_byte(p[0]),
            n: FlagEffect::from_byte(p[1]),
            h: FlagEffect::from_byte(p[2]),
            c: FlagEffect::from_byte(p[3]),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Flags, FlagEffect)> {
        [
            (Flags::Z, self.z),
            (Flags::N, self.n),
            (Flags::H, self.h),
            (Flags::C, self.c),
        ]
        .into_iter()
    }

    /// 可能被修改的旗標集合
    pub fn affected(&self) -> Flags {
        self.iter()
            .filter(|(_, e)| *e != FlagEffect::Unaffected)
            .fold(Flags::empty(), |acc, (flag, _)| acc | flag)
    }
}

impl fmt::Display for FlagEffects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (flag, letter) in self.iter().zip(['Z', 'N', 'H', 'C']) {
            let c = match flag.1 {
                FlagEffect::Unaffected => '-',
                FlagEffect::Reset => '0',
                FlagEffect::Set => '1',
                FlagEffect::Computed => letter,
            };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// 指令描述：助記符、長度、週期、運算元與旗標影響
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Descriptor {
    pub opcode: Opcode,
    pub mnemonic: Mnemonic,
    pub operands: [Option<Operand>; 2],
    pub length: u8,
    pub cycles: Cycles,
    pub flags: FlagEffects,
}

impl Descriptor {
    pub fn operands(&self) -> impl Iterator<Item = Operand> + '_ {
        self.operands.iter().flatten().copied()
    }

    /// 依讀取順序列出需要從指令流讀取的立即值
    pub fn immediates(&self) -> impl Iterator<Item = ImmediateKind> + '_ {
        self.operands().filter_map(Operand::immediate)
    }

    pub fn operand_bytes(&self) -> u8 {
        self.immediates().map(ImmediateKind::width).sum()
    }

    /// 依選擇子與運算元寬度推算的長度；合法的描述必須等於 `length`
    pub fn expected_length(&self) -> u8 {
        self.opcode.selector_len() + self.operand_bytes()
    }

    pub fn is_control_transfer(&self) -> bool {
        self.mnemonic.is_control_transfer()
    }

    pub fn condition(&self) -> Option<Cond> {
        self.operands().find_map(|op| match op {
            Operand::Cond(c) => Some(c),
            _ => None,
        })
    }

    pub fn is_illegal(&self) -> bool {
        self.mnemonic == Mnemonic::Illegal
    }

    pub fn is_prefix(&self) -> bool {
        self.mnemonic == Mnemonic::Prefix
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_illegal() {
            return write!(f, "ILLEGAL_{:02X}", self.opcode.byte());
        }
        write!(f, "{}", self.mnemonic)?;
        for op in self.operands() {
            write!(f, " {}", op)?;
        }
        Ok(())
    }
}

/// 不可變的指令目錄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    unprefixed: Vec<Option<Descriptor>>,
    cbprefixed: Vec<Option<Descriptor>>,
}

impl Catalog {
    /// 內建的完整 LR35902 指令表
    pub fn builtin() -> Self {
        table::build()
    }

    /// 從 JSON 操作碼描述建立目錄；描述中缺少的格子成為空洞
    pub fn from_json(data: &str) -> Result<Self, crate::error::CatalogError> {
        json::parse(data)
    }

    /// 將目錄序列化回同樣格式的 JSON 描述
    pub fn to_json(&self) -> Result<String, crate::error::CatalogError> {
        json::render(self)
    }

    pub(crate) fn from_tables(
        mut unprefixed: Vec<Option<Descriptor>>,
        mut cbprefixed: Vec<Option<Descriptor>>,
    ) -> Self {
        unprefixed.resize(256, None);
        cbprefixed.resize(256, None);
        Catalog {
            unprefixed,
            cbprefixed,
        }
    }

    pub fn lookup(&self, opcode: Opcode) -> Option<&Descriptor> {
        let table = match opcode {
            Opcode::Base(_) => &self.unprefixed,
            Opcode::Extended(_) => &self.cbprefixed,
        };
        table.get(opcode.byte() as usize).and_then(Option::as_ref)
    }

    pub fn base(&self, byte: u8) -> Option<&Descriptor> {
        self.lookup(Opcode::Base(byte))
    }

    pub fn extended(&self, byte: u8) -> Option<&Descriptor> {
        self.lookup(Opcode::Extended(byte))
    }

    /// 所有已指派的描述，先無前綴再 CB 前綴
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.unprefixed
            .iter()
            .chain(self.cbprefixed.iter())
            .flatten()
    }

    /// 未指派的選擇子
    pub fn holes(&self) -> impl Iterator<Item = Opcode> + '_ {
        (0..=255u8)
            .map(Opcode::Base)
            .chain((0..=255u8).map(Opcode::Extended))
            .filter(|op| self.lookup(*op).is_none())
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::builtin()
    }
}
