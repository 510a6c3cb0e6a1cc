// 記憶體 - 平坦、固定長度、以位元組定址
//
// 讀取超過長度的位址一律回傳 0；寫入超過長度的位址會被丟棄。
// 需要嚴格邊界檢查的呼叫者必須自行處理。

use log::warn;

/// 16 位元位址空間的最大長度
pub const ADDRESS_SPACE: usize = 0x10000;

pub trait Memory {
    fn len(&self) -> usize;
    fn read_byte(&self, address: u16) -> u8;
    fn write_byte(&mut self, address: u16, value: u8);

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 小端序讀取 16 位元字
    fn read_word(&self, address: u16) -> u16 {
        let lo = self.read_byte(address) as u16;
        let hi = self.read_byte(address.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    fn write_word(&mut self, address: u16, value: u16) {
        self.write_byte(address, (value & 0xFF) as u8);
        self.write_byte(address.wrapping_add(1), (value >> 8) as u8);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ram {
    memory: Vec<u8>,
}

impl Ram {
    /// 建立長度為 `size` 的記憶體 (上限為 64 KiB)
    pub fn new(size: usize) -> Self {
        Ram {
            memory: vec![0; size.min(ADDRESS_SPACE)],
        }
    }

    /// 以程式內容建立記憶體，長度恰為程式長度
    pub fn from_program(program: &[u8]) -> Self {
        let mut ram = Ram::new(program.len());
        ram.load(0, program);
        ram
    }

    /// 將 `bytes` 複製到 `offset` 開始的位置，超出的部分會被截掉
    pub fn load(&mut self, offset: usize, bytes: &[u8]) -> usize {
        if offset >= self.memory.len() {
            return 0;
        }
        let end = (offset + bytes.len()).min(self.memory.len());
        let count = end - offset;
        self.memory[offset..end].copy_from_slice(&bytes[..count]);
        if count < bytes.len() {
            warn!(
                "program truncated: {} of {} bytes fit at offset {:#06X}",
                count,
                bytes.len(),
                offset
            );
        }
        count
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }
}

impl Memory for Ram {
    fn len(&self) -> usize {
        self.memory.len()
    }

    fn read_byte(&self, address: u16) -> u8 {
        self.memory.get(address as usize).copied().unwrap_or(0)
    }

    fn write_byte(&mut self, address: u16, value: u8) {
        match self.memory.get_mut(address as usize) {
            Some(slot) => *slot = value,
            None => warn!(
                "write {:02X} to {:#06X} dropped (memory length {:#06X})",
                value,
                address,
                self.memory.len()
            ),
        }
    }
}
