//! LR35902 (Game Boy) 指令集模擬器
//!
//! 以表格驅動的指令目錄為中心：解碼器把位元組轉成 [`Instruction`]，
//! 編碼器把它還原成完全相同的位元組，執行引擎依指令語意修改
//! 暫存器、旗標與記憶體。
//!
//! ```
//! use std::sync::Arc;
//! use rust_gb_isa::{Catalog, Engine, EngineConfig};
//!
//! let mut engine = Engine::from_program(
//!     Arc::new(Catalog::builtin()),
//!     &[0xC6, 0xFF, 0x76], // ADD A,FF; HALT
//!     EngineConfig::default(),
//! );
//! engine.run().unwrap();
//! assert_eq!(engine.registers().get_a(), 255);
//! assert_eq!(engine.registers().get_pc(), 2);
//! ```

pub mod config;
pub mod cpu;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod instruction;
pub mod instructions;
pub mod mmu;
pub mod opcodes;
pub mod registers;
pub mod snapshot;

pub use config::EngineConfig;
pub use cpu::{Cpu, CpuState, Engine, InterruptMasterState, RunSummary, StepOutcome};
pub use decoder::{ByteSource, Decoder, InstructionStream, MemorySource, decode};
pub use encoder::{encode, encode_all, encode_into};
pub use error::{CatalogError, DecodeError, Error, ExecError, Result};
pub use instruction::{Instruction, Operands, Value};
pub use mmu::{Memory, Ram};
pub use opcodes::{
    Catalog, Cond, Cycles, Descriptor, FlagEffect, FlagEffects, ImmediateKind, Mnemonic, Opcode,
    Operand,
};
pub use registers::{Flags, Reg8, Reg16, Registers};
pub use snapshot::Snapshot;
