use super::{Heap, HeapHandle, HEAP_SIZE, MAX_DIMS, MAX_VARS, MAX_VAR_LEN, STRING_SIZE};
use crate::error;
use crate::lang::Error;
use std::ops::BitOr;

type Result<T> = std::result::Result<T, Error>;

/// First dimension of an array parameter that has not been dimensioned yet.
pub const DIMS_UNDIMENSIONED: i16 = -1;

/// Type tag and modifier flags of a variable.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct VarType(u8);

impl VarType {
    pub const NBR: VarType = VarType(0x01);
    pub const STR: VarType = VarType(0x02);
    pub const INT: VarType = VarType(0x04);
    /// Value storage belongs to another variable.
    pub const PTR: VarType = VarType(0x08);
    pub const IMPLIED: VarType = VarType(0x10);
    pub const CONST: VarType = VarType(0x20);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, other: VarType) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_string(self) -> bool {
        self.contains(VarType::STR)
    }

    pub fn is_integer(self) -> bool {
        self.contains(VarType::INT)
    }

    pub fn is_pointer(self) -> bool {
        self.contains(VarType::PTR)
    }
}

impl BitOr for VarType {
    type Output = VarType;
    fn bitor(self, rhs: VarType) -> VarType {
        VarType(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    None,
    Float(f64),
    Integer(i64),
    Heap(HeapHandle),
}

/// One variable record.
#[derive(Debug, Clone, PartialEq)]
pub struct Var {
    pub name: String,
    pub var_type: VarType,
    /// Call depth, 0 for globals.
    pub level: u32,
    /// Upper bounds, 0 terminated. All zero for a scalar.
    pub dims: [i16; MAX_DIMS],
    /// Capacity of each string element.
    pub size: usize,
    pub value: Value,
}

impl Var {
    pub fn is_array(&self) -> bool {
        self.dims[0] != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Bucket {
    Empty,
    Tombstone,
    Occupied(usize),
}

/// Result of [`VarTable::find`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Found {
    /// Slot matching both name and level.
    pub slot: Option<usize>,
    /// Global of the same name, seen while probing.
    pub global: Option<usize>,
}

/// ## Variable table
///
/// Fixed number of record slots indexed by an open addressing hash.
/// The index is larger than the slot count so a probe always meets an
/// empty or deleted bucket before it wraps.

#[derive(Debug)]
pub struct VarTable {
    slots: Vec<Option<Var>>,
    buckets: Vec<Bucket>,
    heap: Heap,
    base: i16,
    live: usize,
    top: usize,
    free_idx: usize,
}

impl Default for VarTable {
    fn default() -> VarTable {
        VarTable::new(MAX_VARS, 0)
    }
}

impl VarTable {
    pub fn new(capacity: usize, base: i16) -> VarTable {
        VarTable::with_heap(capacity, base, Heap::new(HEAP_SIZE))
    }

    pub fn with_heap(capacity: usize, base: i16, heap: Heap) -> VarTable {
        VarTable {
            slots: vec![None; capacity],
            buckets: vec![Bucket::Empty; capacity + capacity / 4 + 1],
            heap,
            base,
            live: 0,
            top: 0,
            free_idx: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn base(&self) -> i16 {
        self.base
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// One past the highest slot in use.
    pub fn top(&self) -> usize {
        self.top
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn get(&self, slot: usize) -> Option<&Var> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Var> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Create a variable and return its slot. A `string_capacity` of 0
    /// means the default string size.
    pub fn add(
        &mut self,
        name: &str,
        var_type: VarType,
        level: u32,
        dims: &[i16],
        string_capacity: usize,
    ) -> Result<usize> {
        if self.live >= self.slots.len() {
            return Err(error!(CapacityExceeded));
        }
        if dims.len() > MAX_DIMS {
            return Err(error!(DimensionError));
        }
        let mut bounds = [0; MAX_DIMS];
        bounds[..dims.len()].copy_from_slice(dims);
        if bounds[0] != DIMS_UNDIMENSIONED {
            for bound in bounds.iter().take_while(|b| **b != 0) {
                if *bound <= self.base {
                    return Err(error!(DimensionError));
                }
            }
        }
        let size = match string_capacity {
            0 => STRING_SIZE,
            n if n > STRING_SIZE => return Err(error!(StringTooLong)),
            n => n,
        };
        let name = var_name(name);
        let bucket = self.insertion_bucket(&name)?;
        let slot = match (self.free_idx..self.slots.len()).find(|i| self.slots[*i].is_none()) {
            Some(slot) => slot,
            None => return Err(error!(InternalError; "NO FREE SLOT")),
        };
        let mut var = Var {
            name,
            var_type,
            level,
            dims: bounds,
            size: if var_type.is_string() { size } else { 0 },
            value: Value::None,
        };
        var.value = self.allocate(&var)?;
        self.slots[slot] = Some(var);
        self.buckets[bucket] = Bucket::Occupied(slot);
        self.live += 1;
        self.free_idx = slot + 1;
        self.top = self.top.max(slot + 1);
        Ok(slot)
    }

    fn allocate(&mut self, var: &Var) -> Result<Value> {
        if var.var_type.is_pointer() || var.dims[0] == DIMS_UNDIMENSIONED {
            return Ok(Value::None);
        }
        let element = if var.var_type.is_string() { var.size + 1 } else { 8 };
        if var.is_array() {
            let base = i64::from(self.base);
            let bytes = var
                .dims
                .iter()
                .take_while(|d| **d != 0)
                .map(|d| (i64::from(*d) - base + 1) as usize)
                .try_fold(element, |total, count| total.checked_mul(count));
            return match bytes {
                Some(bytes) => Ok(Value::Heap(self.heap.alloc(bytes)?)),
                None => Err(error!(OutOfMemory)),
            };
        }
        if var.var_type.is_string() {
            Ok(Value::Heap(self.heap.alloc(element)?))
        } else if var.var_type.is_integer() {
            Ok(Value::Integer(0))
        } else {
            Ok(Value::Float(0.0))
        }
    }

    fn insertion_bucket(&self, name: &str) -> Result<usize> {
        let start = self.start_bucket(name);
        let mut i = start;
        loop {
            match self.buckets[i] {
                Bucket::Empty | Bucket::Tombstone => return Ok(i),
                Bucket::Occupied(_) => {}
            }
            i = (i + 1) % self.buckets.len();
            if i == start {
                debug_assert!(false, "variable hash index full");
                return Err(error!(HashIndexFull));
            }
        }
    }

    fn start_bucket(&self, name: &str) -> usize {
        fnv1a(name.as_bytes()) as usize % self.buckets.len()
    }

    pub fn find(&self, name: &str, level: u32) -> Found {
        let name = var_name(name);
        let mut found = Found::default();
        let start = self.start_bucket(&name);
        let mut i = start;
        loop {
            match self.buckets[i] {
                Bucket::Empty => break,
                Bucket::Tombstone => {}
                Bucket::Occupied(slot) => {
                    if let Some(var) = &self.slots[slot] {
                        if var.name == name {
                            if var.level == 0 {
                                found.global = Some(slot);
                            }
                            if var.level == level {
                                found.slot = Some(slot);
                                break;
                            }
                        }
                    }
                }
            }
            i = (i + 1) % self.buckets.len();
            if i == start {
                break;
            }
        }
        found
    }

    pub fn delete(&mut self, slot: usize) -> Result<()> {
        let var = match self.slots.get_mut(slot).and_then(Option::take) {
            Some(var) => var,
            None => return Err(error!(InternalError; "NO SUCH VARIABLE")),
        };
        let start = self.start_bucket(&var.name);
        let mut i = start;
        loop {
            if self.buckets[i] == Bucket::Occupied(slot) {
                self.buckets[i] = Bucket::Tombstone;
                break;
            }
            i = (i + 1) % self.buckets.len();
            if i == start {
                debug_assert!(false, "variable missing from hash index");
                break;
            }
        }
        if let Value::Heap(handle) = var.value {
            if !var.var_type.is_pointer() {
                self.heap.free(handle);
            }
        }
        self.live -= 1;
        while self.top > 0 && self.slots[self.top - 1].is_none() {
            self.top -= 1;
        }
        if slot < self.free_idx {
            self.free_idx = slot;
        }
        Ok(())
    }

    /// Delete every variable at `min_level` or deeper.
    pub fn delete_all(&mut self, min_level: u32) {
        for slot in (0..self.top).rev() {
            let doomed = self.slots[slot]
                .as_ref()
                .map_or(false, |var| var.level >= min_level);
            if doomed {
                let deleted = self.delete(slot);
                debug_assert!(deleted.is_ok());
            }
        }
        if min_level == 0 {
            for bucket in self.buckets.iter_mut() {
                *bucket = Bucket::Empty;
            }
            self.heap.clear();
            self.free_idx = 0;
        }
    }

    /// Point a `PTR` variable at storage owned by another variable.
    pub fn alias(&mut self, slot: usize, target: usize) -> Result<()> {
        let value = match self.get(target) {
            Some(var) => var.value,
            None => return Err(error!(InternalError; "NO SUCH VARIABLE")),
        };
        match self.get_mut(slot) {
            Some(var) if var.var_type.is_pointer() => {
                var.value = value;
                Ok(())
            }
            _ => Err(error!(InternalError; "NOT A POINTER")),
        }
    }

    pub fn float(&self, slot: usize) -> Option<f64> {
        match self.get(slot)?.value {
            Value::Float(f) => Some(f),
            Value::Integer(i) => Some(i as f64),
            _ => None,
        }
    }

    pub fn integer(&self, slot: usize) -> Option<i64> {
        match self.get(slot)?.value {
            Value::Integer(i) => Some(i),
            Value::Float(f) => Some(f.round() as i64),
            _ => None,
        }
    }

    pub fn set_float(&mut self, slot: usize, f: f64) -> Result<()> {
        match self.get_mut(slot) {
            Some(var) if !var.is_array() && !var.var_type.is_string() => {
                var.value = if var.var_type.is_integer() {
                    Value::Integer(f.round() as i64)
                } else {
                    Value::Float(f)
                };
                Ok(())
            }
            _ => Err(error!(InternalError; "NOT A NUMBER")),
        }
    }

    pub fn set_integer(&mut self, slot: usize, i: i64) -> Result<()> {
        match self.get_mut(slot) {
            Some(var) if !var.is_array() && !var.var_type.is_string() => {
                var.value = if var.var_type.is_integer() {
                    Value::Integer(i)
                } else {
                    Value::Float(i as f64)
                };
                Ok(())
            }
            _ => Err(error!(InternalError; "NOT A NUMBER")),
        }
    }

    /// Contents of a scalar string, stored length first.
    pub fn string(&self, slot: usize) -> Option<&[u8]> {
        let var = self.get(slot)?;
        if !var.var_type.is_string() || var.is_array() {
            return None;
        }
        match var.value {
            Value::Heap(handle) => {
                let block = self.heap.get(handle)?;
                let len = *block.first()? as usize;
                block.get(1..1 + len)
            }
            _ => None,
        }
    }

    pub fn set_string(&mut self, slot: usize, s: &[u8]) -> Result<()> {
        let (handle, size) = match self.get(slot) {
            Some(var) if var.var_type.is_string() && !var.is_array() => match var.value {
                Value::Heap(handle) => (handle, var.size),
                _ => return Err(error!(InternalError; "NO STRING STORAGE")),
            },
            _ => return Err(error!(InternalError; "NOT A STRING")),
        };
        if s.len() > size {
            return Err(error!(StringTooLong));
        }
        match self.heap.get_mut(handle) {
            Some(block) => {
                block[0] = s.len() as u8;
                block[1..1 + s.len()].copy_from_slice(s);
                Ok(())
            }
            None => Err(error!(InternalError; "NO STRING STORAGE")),
        }
    }

    /// Raw value storage of a string or array.
    pub fn storage(&self, slot: usize) -> Option<&[u8]> {
        match self.get(slot)?.value {
            Value::Heap(handle) => self.heap.get(handle),
            _ => None,
        }
    }

    #[cfg(test)]
    fn index_is_clear(&self) -> bool {
        self.buckets.iter().all(|b| *b == Bucket::Empty)
    }
}

/// Upper case and truncate a name the way it is stored.
pub fn var_name(name: &str) -> String {
    name.chars()
        .map(|c| c.to_ascii_uppercase())
        .take(MAX_VAR_LEN)
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0x811c_9dc5, |hash, b| {
        (hash ^ u32::from(*b)).wrapping_mul(0x0100_0193)
    })
}
