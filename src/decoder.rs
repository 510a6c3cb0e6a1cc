//! 解碼器：從位元組來源的某個位置讀出一條指令
//!
//! 兩種來源：
//! - 位元組切片：讀到結尾之後就是「沒有資料」，用來逐條走訪有限的指令流。
//! - [`Memory`]：超過長度的位址讀到 0，與記憶體契約一致。

use crate::error::DecodeError;
use crate::instruction::{Instruction, Operands, Value};
use crate::mmu::Memory;
use crate::opcodes::{Catalog, ImmediateKind, Opcode, PREFIX_CB};

/// 可依位置讀取位元組的來源
pub trait ByteSource {
    fn byte_at(&self, position: usize) -> Option<u8>;
}

impl ByteSource for [u8] {
    fn byte_at(&self, position: usize) -> Option<u8> {
        self.get(position).copied()
    }
}

/// 把 [`Memory`] 當成位元組來源；超出記憶體的位置一律讀到 0
#[derive(Debug)]
pub struct MemorySource<'a, M: Memory + ?Sized>(pub &'a M);

impl<M: Memory + ?Sized> ByteSource for MemorySource<'_, M> {
    fn byte_at(&self, position: usize) -> Option<u8> {
        if position >= self.0.len() {
            return Some(0);
        }
        Some(self.0.read_byte(position as u16))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Decoder<'c> {
    catalog: &'c Catalog,
}

impl<'c> Decoder<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Decoder { catalog }
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    /// 解碼 `position` 處的一條指令，回傳指令與消耗的位元組數
    pub fn decode<S: ByteSource + ?Sized>(
        &self,
        source: &S,
        position: usize,
    ) -> Result<(Instruction, usize), DecodeError> {
        let ended = DecodeError::StreamEnded { position };

        let first = source.byte_at(position).ok_or(ended)?;
        let opcode = if first == PREFIX_CB {
            let second = source.byte_at(position + 1).ok_or(ended)?;
            Opcode::Extended(second)
        } else {
            Opcode::Base(first)
        };

        let descriptor = self
            .catalog
            .lookup(opcode)
            .ok_or(DecodeError::UnrecognizedOpcode { opcode, position })?;

        let mut cursor = position + opcode.selector_len() as usize;
        let mut operands = Operands::None;
        for kind in descriptor.immediates() {
            let truncated = DecodeError::TruncatedOperand { opcode, position };
            let lo = source.byte_at(cursor).ok_or(truncated)?;
            let hi = match kind {
                ImmediateKind::U16 => source.byte_at(cursor + 1).ok_or(truncated)?,
                _ => 0,
            };
            cursor += kind.width() as usize;
            let value = Value::from_bytes(kind, lo, hi);
            operands = match operands {
                Operands::None => Operands::One(value),
                Operands::One(first) => Operands::Two(first, value),
                Operands::Two(_, _) => operands,
            };
        }

        Ok((
            Instruction::from_parts(*descriptor, operands),
            cursor - position,
        ))
    }

    /// 從頭走訪一段位元組
    pub fn stream<'s>(&self, bytes: &'s [u8]) -> InstructionStream<'c, 's> {
        InstructionStream {
            decoder: *self,
            bytes,
            position: 0,
            failed: false,
        }
    }
}

/// 便利函式：以指定目錄解碼一條指令
pub fn decode<S: ByteSource + ?Sized>(
    catalog: &Catalog,
    source: &S,
    position: usize,
) -> Result<(Instruction, usize), DecodeError> {
    Decoder::new(catalog).decode(source, position)
}

/// 逐條解碼的迭代器
///
/// 遇到 `StreamEnded` 時正常結束；其他錯誤回傳一次後停止。
#[derive(Debug)]
pub struct InstructionStream<'c, 's> {
    decoder: Decoder<'c>,
    bytes: &'s [u8],
    position: usize,
    failed: bool,
}

impl InstructionStream<'_, '_> {
    pub fn position(&self) -> usize {
        self.position
    }
}

impl Iterator for InstructionStream<'_, '_> {
    type Item = Result<(usize, Instruction), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.decoder.decode(self.bytes, self.position) {
            Ok((instruction, consumed)) => {
                let at = self.position;
                self.position += consumed;
                Some(Ok((at, instruction)))
            }
            Err(e) if e.is_stream_end() => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmu::Ram;

    fn render(bytes: &[u8]) -> Vec<String> {
        let catalog = Catalog::builtin();
        Decoder::new(&catalog)
            .stream(bytes)
            .map(|r| r.unwrap().1.to_string())
            .collect()
    }

    #[test]
    fn test_decode_scenarios() {
        assert_eq!(render(&[0x10]), vec!["STOP 0"]);
        assert_eq!(render(&[0x81]), vec!["ADD A C"]);
        assert_eq!(render(&[0x81, 0x06, 0xAA]), vec!["ADD A C", "LD B AA"]);
        assert_eq!(render(&[0xCB, 0x01]), vec!["RLC C"]);
        assert_eq!(render(&[0xF8, 0x81]), vec!["LD HL SP+-7F"]);
        assert_eq!(render(&[0xC0]), vec!["RET NZ"]);
    }

    #[test]
    fn test_bytes_consumed() {
        let catalog = Catalog::builtin();
        let decoder = Decoder::new(&catalog);
        let bytes = [0x00, 0x21, 0x34, 0x12, 0xCB, 0x7C];
        let (nop, n) = decoder.decode(&bytes[..], 0).unwrap();
        assert_eq!((nop.to_string().as_str(), n), ("NOP", 1));
        let (ld, n) = decoder.decode(&bytes[..], 1).unwrap();
        assert_eq!(n, 3);
        assert_eq!(ld.imm16(), 0x1234);
        assert_eq!(ld.to_string(), "LD HL 1234");
        let (bit, n) = decoder.decode(&bytes[..], 4).unwrap();
        assert_eq!(n, 2);
        assert_eq!(bit.to_string(), "BIT 7 H");
    }

    #[test]
    fn test_stream_ended_vs_truncated() {
        let catalog = Catalog::builtin();
        let decoder = Decoder::new(&catalog);
        let empty: [u8; 0] = [];
        assert_eq!(
            decoder.decode(&empty[..], 0),
            Err(DecodeError::StreamEnded { position: 0 })
        );
        // 只有前綴也算沒有完整的選擇子
        assert_eq!(
            decoder.decode(&[0xCBu8][..], 0),
            Err(DecodeError::StreamEnded { position: 0 })
        );
        assert_eq!(
            decoder.decode(&[0x00u8, 0xC3, 0x00][..], 1),
            Err(DecodeError::TruncatedOperand {
                opcode: Opcode::Base(0xC3),
                position: 1
            })
        );
    }

    #[test]
    fn test_unrecognized_opcode_carries_selector() {
        let catalog = Catalog::from_json(r#"{ "unprefixed": {} }"#).unwrap();
        let decoder = Decoder::new(&catalog);
        assert_eq!(
            decoder.decode(&[0x00u8][..], 0),
            Err(DecodeError::UnrecognizedOpcode {
                opcode: Opcode::Base(0x00),
                position: 0
            })
        );
        assert_eq!(
            decoder.decode(&[0xCBu8, 0x11][..], 0),
            Err(DecodeError::UnrecognizedOpcode {
                opcode: Opcode::Extended(0x11),
                position: 0
            })
        );
    }

    #[test]
    fn test_stream_stops_after_error() {
        let catalog = Catalog::builtin();
        let mut stream = Decoder::new(&catalog).stream(&[0x00, 0x06]);
        assert!(matches!(stream.next(), Some(Ok((0, _)))));
        assert!(matches!(
            stream.next(),
            Some(Err(DecodeError::TruncatedOperand { .. }))
        ));
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_memory_source_reads_zero_past_end() {
        let catalog = Catalog::builtin();
        let ram = Ram::from_program(&[0x3E]);
        let (ld, n) = Decoder::new(&catalog)
            .decode(&MemorySource(&ram), 0)
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(ld.to_string(), "LD A 00");
    }

    #[test]
    fn test_memory_source_does_not_wrap_at_top_address() {
        let catalog = Catalog::builtin();
        let mut ram = Ram::new(0x10000);
        ram.write_byte(0x0000, 0x12);
        ram.write_byte(0xFFFF, 0x3E);
        let (ld, n) = Decoder::new(&catalog)
            .decode(&MemorySource(&ram), 0xFFFF)
            .unwrap();
        assert_eq!(n, 2);
        assert_eq!(ld.imm8(), 0);
        assert_eq!(MemorySource(&ram).byte_at(0x10000), Some(0));
    }
}
