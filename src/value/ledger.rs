use compact_str::CompactString;

#[derive(Debug)]
struct LedgerNode {
    key: CompactString,
    previous: Option<usize>,
    next: Option<usize>,
}

/// Insertion ordered set of dictionary keys, kept as a doubly linked list over a slot vector.
///
/// Slots freed by `remove` are recycled by later inserts, so a slot index is only meaningful
/// while its key is present.
#[derive(Debug, Default)]
pub struct KeyLedger {
    slots: Vec<Option<LedgerNode>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl KeyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `key` at the tail and returns its slot.
    pub fn insert(&mut self, key: CompactString) -> usize {
        let node = LedgerNode {
            key,
            previous: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };

        match self.tail {
            Some(tail) => {
                if let Some(node) = self.slots[tail].as_mut() {
                    node.next = Some(slot);
                }
            }
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
        slot
    }

    /// Unlinks the key stored at `slot`. Unknown slots are ignored.
    pub fn remove(&mut self, slot: usize) -> Option<CompactString> {
        let node = self.slots.get_mut(slot)?.take()?;

        match node.previous {
            Some(previous) => {
                if let Some(previous) = self.slots[previous].as_mut() {
                    previous.next = node.next;
                }
            }
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => {
                if let Some(next) = self.slots[next].as_mut() {
                    next.previous = node.previous;
                }
            }
            None => self.tail = node.previous,
        }

        self.free.push(slot);
        self.len -= 1;
        Some(node.key)
    }

    pub fn first(&self) -> Option<&CompactString> {
        self.key_at(self.head?)
    }

    pub fn key_at(&self, slot: usize) -> Option<&CompactString> {
        self.slots.get(slot)?.as_ref().map(|node| &node.key)
    }

    /// The key following the one stored at `slot`.
    pub fn next_of(&self, slot: usize) -> Option<&CompactString> {
        let next = self.slots.get(slot)?.as_ref()?.next?;
        self.key_at(next)
    }

    pub fn iter(&self) -> LedgerIter<'_> {
        LedgerIter {
            ledger: self,
            cursor: self.head,
        }
    }
}

pub struct LedgerIter<'a> {
    ledger: &'a KeyLedger,
    cursor: Option<usize>,
}

impl<'a> Iterator for LedgerIter<'a> {
    type Item = &'a CompactString;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.ledger.slots.get(self.cursor?)?.as_ref()?;
        self.cursor = node.next;
        Some(&node.key)
    }
}
