//! 編碼器：解碼器的結構反函數
//!
//! 依序輸出前綴 (若有)、選擇子、各運算元的原始位元組。

use crate::instruction::Instruction;
use crate::opcodes::{Opcode, PREFIX_CB};

/// 把一條指令附加到 `out`
pub fn encode_into(instruction: &Instruction, out: &mut Vec<u8>) {
    match instruction.opcode() {
        Opcode::Base(b) => out.push(b),
        Opcode::Extended(b) => {
            out.push(PREFIX_CB);
            out.push(b);
        }
    }
    for value in instruction.operands().iter() {
        value.write_bytes(out);
    }
}

pub fn encode(instruction: &Instruction) -> Vec<u8> {
    let mut out = Vec::with_capacity(instruction.length() as usize);
    encode_into(instruction, &mut out);
    out
}

/// 依序編碼一串指令
pub fn encode_all<'a, I>(instructions: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Instruction>,
{
    let mut out = Vec::new();
    for instruction in instructions {
        encode_into(instruction, &mut out);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;
    use crate::instruction::Value;
    use crate::opcodes::Catalog;

    #[test]
    fn test_encode_emits_prefix_and_operands() {
        let catalog = Catalog::builtin();
        let rlc = Instruction::new(catalog.extended(0x01).unwrap(), &[]).unwrap();
        assert_eq!(encode(&rlc), vec![0xCB, 0x01]);

        let ld = Instruction::new(catalog.base(0x31).unwrap(), &[Value::U16(0xFFFE)]).unwrap();
        assert_eq!(encode(&ld), vec![0x31, 0xFE, 0xFF]);

        let jr = Instruction::new(catalog.base(0x18).unwrap(), &[Value::I8(-2)]).unwrap();
        assert_eq!(encode(&jr), vec![0x18, 0xFE]);
    }

    #[test]
    fn test_encode_length_matches_descriptor() {
        let catalog = Catalog::builtin();
        for desc in catalog.iter().filter(|desc| !desc.is_prefix()) {
            let values: Vec<Value> = desc
                .immediates()
                .map(|kind| Value::from_bytes(kind, 0x12, 0x34))
                .collect();
            let instruction = Instruction::new(desc, &values).unwrap();
            assert_eq!(
                encode(&instruction).len(),
                desc.length as usize,
                "{}",
                desc.opcode
            );
        }
    }

    #[test]
    fn test_encode_inverts_decode() {
        let catalog = Catalog::builtin();
        let bytes = [0x81, 0x06, 0xAA, 0xCB, 0x01, 0xF8, 0x81, 0xC3, 0x50, 0x01, 0x10];
        let decoded: Vec<Instruction> = Decoder::new(&catalog)
            .stream(&bytes)
            .map(|r| r.unwrap().1)
            .collect();
        assert_eq!(decoded.len(), 6);
        assert_eq!(decoded[4].to_string(), "JP 0150");
        assert_eq!(decoded[5].to_string(), "STOP 0");
        assert_eq!(encode_all(&decoded), bytes.to_vec());
    }
}
