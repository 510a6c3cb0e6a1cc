//! 已解碼的指令
//!
//! [`Instruction`] 是描述 ([`Descriptor`]) 加上 0 至 2 個運算元值。
//! 它只存在於一次解碼與一次執行 (或編碼) 之間。

use std::fmt;

use crate::opcodes::{Descriptor, ImmediateKind, Mnemonic, Opcode, Operand};

/// 從指令流讀出的原始運算元值
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    U8(u8),
    /// 二補數位移；位元組內容與編碼完全相同
    I8(i8),
    U16(u16),
}

impl Value {
    /// 依種類從原始位元組組出值 (16 位元為小端序)
    pub fn from_bytes(kind: ImmediateKind, lo: u8, hi: u8) -> Self {
        match kind {
            ImmediateKind::U8 => Value::U8(lo),
            ImmediateKind::I8 => Value::I8(lo as i8),
            ImmediateKind::U16 => Value::U16(u16::from_le_bytes([lo, hi])),
        }
    }

    pub fn kind(self) -> ImmediateKind {
        match self {
            Value::U8(_) => ImmediateKind::U8,
            Value::I8(_) => ImmediateKind::I8,
            Value::U16(_) => ImmediateKind::U16,
        }
    }

    /// 以寫入順序附加原始位元組
    pub fn write_bytes(self, out: &mut Vec<u8>) {
        match self {
            Value::U8(v) => out.push(v),
            Value::I8(v) => out.push(v as u8),
            Value::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Value::U8(v) => v,
            Value::I8(v) => v as u8,
            Value::U16(v) => v as u8,
        }
    }

    pub fn as_i8(self) -> i8 {
        self.as_u8() as i8
    }

    pub fn as_u16(self) -> u16 {
        match self {
            Value::U8(v) => v as u16,
            Value::I8(v) => v as u8 as u16,
            Value::U16(v) => v,
        }
    }
}

/// 0、1 或 2 個運算元值，依讀取順序排列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Operands {
    #[default]
    None,
    One(Value),
    Two(Value, Value),
}

impl Operands {
    pub fn len(&self) -> usize {
        match self {
            Operands::None => 0,
            Operands::One(_) => 1,
            Operands::Two(_, _) => 2,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        match (self, index) {
            (Operands::One(v), 0) | (Operands::Two(v, _), 0) => Some(*v),
            (Operands::Two(_, v), 1) => Some(*v),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).filter_map(|i| self.get(i))
    }

    fn push(self, value: Value) -> Option<Operands> {
        match self {
            Operands::None => Some(Operands::One(value)),
            Operands::One(first) => Some(Operands::Two(first, value)),
            Operands::Two(_, _) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    descriptor: Descriptor,
    operands: Operands,
}

impl Instruction {
    /// 建立指令；運算元的數量與種類必須和描述一致
    ///
    /// 前綴位元組本身不是一條指令，回傳 `None`。
    pub fn new(descriptor: &Descriptor, values: &[Value]) -> Option<Self> {
        if descriptor.is_prefix() {
            return None;
        }
        let mut kinds = descriptor.immediates();
        let mut operands = Operands::None;
        for value in values {
            if kinds.next() != Some(value.kind()) {
                return None;
            }
            operands = operands.push(*value)?;
        }
        if kinds.next().is_some() {
            return None;
        }
        Some(Instruction {
            descriptor: *descriptor,
            operands,
        })
    }

    /// 解碼器使用：運算元已依描述讀出
    pub(crate) fn from_parts(descriptor: Descriptor, operands: Operands) -> Self {
        Instruction {
            descriptor,
            operands,
        }
    }

    pub fn descriptor(&self) -> &Descriptor {
        &self.descriptor
    }

    pub fn opcode(&self) -> Opcode {
        self.descriptor.opcode
    }

    pub fn mnemonic(&self) -> Mnemonic {
        self.descriptor.mnemonic
    }

    pub fn operands(&self) -> Operands {
        self.operands
    }

    /// 編碼後的位元組長度
    pub fn length(&self) -> u8 {
        self.descriptor.length
    }

    /// 第一個運算元值 (8 位元)
    pub fn imm8(&self) -> u8 {
        self.operands.get(0).map_or(0, Value::as_u8)
    }

    /// 第一個運算元值 (16 位元)
    pub fn imm16(&self) -> u16 {
        self.operands.get(0).map_or(0, Value::as_u16)
    }

    /// 第一個運算元值，以二補數解讀
    pub fn offset(&self) -> i8 {
        self.operands.get(0).map_or(0, Value::as_i8)
    }
}

fn signed_hex(v: i8) -> String {
    if v < 0 {
        format!("-{:02X}", v.unsigned_abs())
    } else {
        format!("{:02X}", v)
    }
}

fn render(op: Operand, value: Option<Value>) -> String {
    match (op, value) {
        (Operand::Imm8, Some(v)) => format!("{:02X}", v.as_u8()),
        (Operand::Imm16, Some(v)) => format!("{:04X}", v.as_u16()),
        (Operand::Rel8, Some(v)) => signed_hex(v.as_i8()),
        (Operand::Addr16, Some(v)) => format!("({:04X})", v.as_u16()),
        (Operand::HighAddr8, Some(v)) => format!("(FF00+{:02X})", v.as_u8()),
        (Operand::SpOffset, Some(v)) => format!("SP+{}", signed_hex(v.as_i8())),
        (op, _) => op.to_string(),
    }
}

impl fmt::Display for Instruction {
    /// 例如 `ADD A C`、`LD B AA`、`LD HL SP+-7F`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.descriptor.is_illegal() {
            return write!(f, "ILLEGAL_{:02X}", self.opcode().byte());
        }
        write!(f, "{}", self.mnemonic())?;
        let mut values = self.operands.iter();
        for op in self.descriptor.operands() {
            let value = match op.immediate() {
                Some(_) => values.next(),
                None => None,
            };
            write!(f, " {}", render(op, value))?;
        }
        Ok(())
    }
}
