use thiserror::Error;

use crate::opcodes::Opcode;

pub type Result<T> = std::result::Result<T, Error>;

/// 頂層錯誤型別，包住各子系統的錯誤
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("cannot serialize output: {0}")]
    Output(#[source] serde_json::Error),
}

/// 解碼錯誤
///
/// `StreamEnded` 是正常的結束訊號；其他兩種都代表程式本身有問題。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("no instruction at position {position:#06X}")]
    StreamEnded { position: usize },
    #[error("operand of {opcode} truncated at position {position:#06X}")]
    TruncatedOperand { opcode: Opcode, position: usize },
    #[error("unrecognized opcode {opcode} at position {position:#06X}")]
    UnrecognizedOpcode { opcode: Opcode, position: usize },
}

impl DecodeError {
    pub fn is_stream_end(&self) -> bool {
        matches!(self, DecodeError::StreamEnded { .. })
    }
}

/// 執行引擎錯誤
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("program counter {pc:#06X} ran past memory end {len:#06X} without HALT")]
    MemoryOverrun { pc: usize, len: usize },
    #[error("step limit of {steps} reached without HALT")]
    StepLimit { steps: u64 },
}

/// 操作碼描述檔 (JSON) 載入錯誤
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("malformed opcode description: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad opcode key '{0}'")]
    BadKey(String),
    #[error("unknown mnemonic '{0}'")]
    UnknownMnemonic(String),
    #[error("unknown operand '{name}' for {opcode}")]
    UnknownOperand { opcode: Opcode, name: String },
    #[error("bad flag effect '{0}'")]
    BadFlag(String),
    #[error("{opcode} declares {declared} bytes but its operands need {expected}")]
    LengthMismatch {
        opcode: Opcode,
        declared: u8,
        expected: u8,
    },
    #[error("{opcode} has no cycle count")]
    MissingCycles { opcode: Opcode },
    #[error("{opcode} has more than two operands")]
    TooManyOperands { opcode: Opcode },
}
