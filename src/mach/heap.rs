use crate::error;
use crate::lang::Error;

type Result<T> = std::result::Result<T, Error>;

/// Handle to a block owned by a [`Heap`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct HeapHandle(u32);

/// ## Variable value storage
///
/// Zero filled blocks with a limit on the total bytes handed out.

#[derive(Debug, Default)]
pub struct Heap {
    blocks: Vec<Option<Vec<u8>>>,
    free: Vec<u32>,
    used: usize,
    limit: usize,
}

impl Heap {
    pub fn new(limit: usize) -> Heap {
        Heap {
            limit,
            ..Heap::default()
        }
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
        self.free.clear();
        self.used = 0;
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn alloc(&mut self, size: usize) -> Result<HeapHandle> {
        match self.used.checked_add(size) {
            Some(used) if used <= self.limit => self.used = used,
            _ => return Err(error!(OutOfMemory)),
        }
        let block = Some(vec![0; size]);
        match self.free.pop() {
            Some(index) => {
                self.blocks[index as usize] = block;
                Ok(HeapHandle(index))
            }
            None => {
                self.blocks.push(block);
                Ok(HeapHandle(self.blocks.len() as u32 - 1))
            }
        }
    }

    pub fn free(&mut self, handle: HeapHandle) {
        if let Some(slot) = self.blocks.get_mut(handle.0 as usize) {
            if let Some(block) = slot.take() {
                self.used -= block.len();
                self.free.push(handle.0);
            }
        }
    }

    pub fn get(&self, handle: HeapHandle) -> Option<&[u8]> {
        self.blocks
            .get(handle.0 as usize)
            .and_then(|b| b.as_deref())
    }

    pub fn get_mut(&mut self, handle: HeapHandle) -> Option<&mut [u8]> {
        self.blocks
            .get_mut(handle.0 as usize)
            .and_then(|b| b.as_deref_mut())
    }
}
