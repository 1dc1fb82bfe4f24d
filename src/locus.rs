//! # Locus records and the sliding locus window
//!
//! A [`Locus`] is one variant site with its per-sample genotype calls. The
//! [`LocusQueue`] is the FIFO the streaming coordinator slides along the
//! coordinate-sorted input: it grows at the tail as sites arrive and advances
//! its head as sites fall out of the window. Storage for evicted loci is
//! reclaimed when the queue fully drains.
use crate::error::LdError;
use crate::genotype::GenotypeCode;

/// Per-locus cap on genotype entries.
pub const MAX_GENOTYPES_PER_LOCUS: usize = 1_000_000;

/// One sample's genotype call at a locus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenotypeEntry {
    pub person_id: i32,
    pub genotype: GenotypeCode,
}

/// One variant site with its genotype calls, kept in strictly increasing
/// `person_id` order.
#[derive(Debug)]
pub struct Locus {
    pub position: i32,
    pub var_id: String,
    pub genotypes: Vec<GenotypeEntry>,
}

/// FIFO of loci over a growable buffer. Live entries are `head..`; `dequeue`
/// only advances the head, so the buffer grows monotonically within one drain
/// cycle and is reset once everything has been evicted.
#[derive(Debug, Default)]
pub struct LocusQueue {
    loci: Vec<Locus>,
    head: usize,
}

impl LocusQueue {
    pub fn new() -> LocusQueue {
        LocusQueue::default()
    }

    /// Append a new locus at the tail, seeded with its first genotype entry.
    pub fn enqueue(&mut self, position: i32, var_id: String, first: GenotypeEntry) {
        self.loci.push(Locus {
            position,
            var_id,
            genotypes: vec![first],
        });
    }

    /// Push a genotype entry onto the most recently enqueued locus.
    pub fn append_to_tail(&mut self, entry: GenotypeEntry) -> Result<(), LdError> {
        // unwrap here because the coordinator always enqueues before appending
        let tail = self.loci.last_mut().unwrap();
        if tail.genotypes.len() == MAX_GENOTYPES_PER_LOCUS {
            return Err(LdError::TooManySamples {
                max: MAX_GENOTYPES_PER_LOCUS,
            });
        }
        debug_assert!(
            tail.genotypes
                .last()
                .map_or(true, |last| last.person_id < entry.person_id),
            "genotype entries must arrive in strictly increasing person_id order"
        );
        tail.genotypes.push(entry);
        Ok(())
    }

    /// Advance the head; the previous head becomes logically dead.
    pub fn dequeue(&mut self) {
        if self.head < self.loci.len() {
            self.head += 1;
        }
    }

    /// Reclaim buffer space once every locus has been evicted.
    pub fn reset_if_drained(&mut self) {
        if self.head >= self.loci.len() {
            self.loci.clear();
            self.head = 0;
        }
    }

    pub fn peek_head(&self) -> Option<&Locus> {
        self.loci.get(self.head)
    }

    /// The head locus together with every later live locus, in queue order.
    pub fn head_split(&self) -> Option<(&Locus, &[Locus])> {
        self.loci[self.head..].split_first()
    }

    pub fn len(&self) -> usize {
        self.loci.len() - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head >= self.loci.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(person_id: i32, code: &[u8; 2]) -> GenotypeEntry {
        GenotypeEntry {
            person_id,
            genotype: GenotypeCode::from_allele_chars(*code).unwrap(),
        }
    }

    #[test]
    fn enqueue_dequeue_lifecycle() {
        let mut queue = LocusQueue::new();
        assert!(queue.is_empty());

        queue.enqueue(100, "rs1".into(), entry(1, b"AA"));
        queue.enqueue(200, "rs2".into(), entry(1, b"Aa"));
        assert_eq!(2, queue.len());
        assert_eq!(100, queue.peek_head().unwrap().position);

        queue.dequeue();
        assert_eq!(1, queue.len());
        assert_eq!(200, queue.peek_head().unwrap().position);

        queue.dequeue();
        assert!(queue.is_empty());
        assert!(queue.peek_head().is_none());
    }

    #[test]
    fn head_split_yields_later_loci_in_order() {
        let mut queue = LocusQueue::new();
        queue.enqueue(100, "rs1".into(), entry(1, b"AA"));
        queue.enqueue(200, "rs2".into(), entry(1, b"AA"));
        queue.enqueue(300, "rs3".into(), entry(1, b"AA"));

        let (head, rest) = queue.head_split().unwrap();
        assert_eq!("rs1", head.var_id);
        let positions: Vec<i32> = rest.iter().map(|locus| locus.position).collect();
        assert_eq!(vec![200, 300], positions);
    }

    #[test]
    fn reset_reclaims_storage_only_when_drained() {
        let mut queue = LocusQueue::new();
        queue.enqueue(100, "rs1".into(), entry(1, b"AA"));
        queue.enqueue(200, "rs2".into(), entry(1, b"AA"));

        queue.dequeue();
        queue.reset_if_drained();
        // still one live locus, reset must not touch it
        assert_eq!(1, queue.len());
        assert_eq!(200, queue.peek_head().unwrap().position);

        queue.dequeue();
        queue.reset_if_drained();
        assert!(queue.is_empty());

        // the queue is reusable after a reset
        queue.enqueue(300, "rs3".into(), entry(1, b"AA"));
        assert_eq!(1, queue.len());
        assert_eq!(300, queue.peek_head().unwrap().position);
    }

    #[test]
    fn append_grows_the_tail_locus() {
        let mut queue = LocusQueue::new();
        queue.enqueue(100, "rs1".into(), entry(1, b"AA"));
        queue.append_to_tail(entry(2, b"Aa")).unwrap();
        queue.append_to_tail(entry(3, b"aa")).unwrap();

        let head = queue.peek_head().unwrap();
        assert_eq!(3, head.genotypes.len());
        let ids: Vec<i32> = head.genotypes.iter().map(|g| g.person_id).collect();
        assert_eq!(vec![1, 2, 3], ids);
    }

    #[test]
    fn append_fails_once_capacity_is_reached() {
        let mut queue = LocusQueue::new();
        queue.enqueue(100, "rs1".into(), entry(1, b"AA"));
        for person_id in 2..=MAX_GENOTYPES_PER_LOCUS as i32 {
            queue.append_to_tail(entry(person_id, b"AA")).unwrap();
        }
        let overflow = queue.append_to_tail(entry(MAX_GENOTYPES_PER_LOCUS as i32 + 1, b"AA"));
        assert_eq!(
            Err(LdError::TooManySamples {
                max: MAX_GENOTYPES_PER_LOCUS
            }),
            overflow
        );
    }
}
