
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::data_types::allele::Allele;
use crate::replay::ReplayError;

/// Base reported for any position outside of the template
pub const UNKNOWN_BASE: u8 = b'N';

/// Replays a single haplotype: the template interleaved with a queue of non-overlapping alleles, one base at a time.
/// The automaton is either reading from the template or from inside an allele.
#[derive(Clone, Debug)]
pub struct HaplotypePlayback {
    /// Shared, read-only reference bases
    template: Arc<[u8]>,
    /// Alleles queued behind `current`, in position order
    pending: VecDeque<Allele>,
    /// The allele being read, or the next one we will reach on the template
    current: Option<Allele>,
    /// The template position we are at; -1 before the first call to `next()`
    template_position: i64,
    /// Offset into `current` when reading an allele, None when reading the template
    position_in_allele: Option<usize>,
    /// End of the last allele added, used to detect self-overlap
    last_allele_end: i64,
    /// Set once `step()` is called with nothing left to read
    finished: bool
}

impl HaplotypePlayback {
    /// Creates an automaton positioned just before the start of the template
    pub fn new(template: Arc<[u8]>) -> Self {
        Self {
            template,
            pending: VecDeque::new(),
            current: None,
            template_position: -1,
            position_in_allele: None,
            last_allele_end: -1,
            finished: false
        }
    }

    /// Queues an allele for replay. `None` (no substitution) and empty insertions are ignored.
    /// Alleles must be added in position order and must not overlap previously added alleles.
    /// # Arguments
    /// * `allele` - the allele to replay on this haplotype
    pub fn add_allele(&mut self, allele: Option<&Allele>) {
        let Some(allele) = allele else {
            return;
        };
        if allele.is_noop() {
            return;
        }
        debug_assert!(allele.start() > self.template_position, "allele {allele} added behind replay position {}", self.template_position);

        if self.current.is_none() {
            self.current = Some(allele.clone());
        } else {
            self.pending.push_back(allele.clone());
        }
        self.last_allele_end = allele.end();
    }

    /// Returns true if `allele` can be added without overlapping the alleles already on this haplotype, and without starting behind the replay position
    pub fn is_new(&self, allele: Option<&Allele>) -> bool {
        match allele {
            Some(a) if !a.is_noop() => a.start() >= self.last_allele_end && a.start() > self.template_position,
            _ => true
        }
    }

    /// Returns true if there are more bases to read.
    /// An insertion placed after the final template base is still read in full.
    pub fn has_next(&self) -> bool {
        let last_position = self.template.len() as i64 - 1;
        if self.template_position < last_position {
            return true;
        }
        match (self.current.as_ref(), self.position_in_allele) {
            (Some(allele), None) => allele.start() > last_position && self.template_position < allele.start() && !allele.is_empty(),
            (Some(allele), Some(offset)) => allele.start() > last_position && offset + 1 < allele.len(),
            (None, _) => false
        }
    }

    /// Advances one base.
    /// # Errors
    /// * if called when `has_next()` is false
    /// * if queued alleles are found to be out of position order
    pub fn next(&mut self) -> Result<(), ReplayError> {
        if !self.has_next() {
            return Err(ReplayError::PastTemplateEnd { position: self.template_position });
        }

        match self.position_in_allele {
            None => {
                self.template_position += 1;
                if self.current.as_ref().is_some_and(|a| a.start() == self.template_position) {
                    self.position_in_allele = Some(0);
                }
            },
            Some(offset) => {
                self.position_in_allele = Some(offset + 1);
            }
        }

        // leaving an allele can land us directly at the start of the next one, and zero-length alleles chain
        while let Some(allele) = self.current.as_ref() {
            if self.position_in_allele != Some(allele.len()) {
                break;
            }
            self.template_position = allele.end();
            self.position_in_allele = None;
            self.current = self.pending.pop_front();

            let Some(next) = self.current.as_ref() else {
                break;
            };
            if self.template_position < next.start() {
                break;
            }
            if self.template_position != next.start() {
                return Err(ReplayError::OutOfOrder {
                    expected: next.start(),
                    position: self.template_position
                });
            }
            self.position_in_allele = Some(0);
        }

        debug_assert!(self.position_in_allele.is_some() || self.current.as_ref().map_or(true, |a| self.template_position <= a.start()));
        Ok(())
    }

    /// Advances one base if possible, otherwise marks this haplotype as finished
    /// # Errors
    /// * if the queued alleles are out of order
    pub fn step(&mut self) -> Result<(), ReplayError> {
        if self.has_next() {
            self.next()
        } else {
            self.finished = true;
            Ok(())
        }
    }

    /// The base at the current position
    pub fn nt(&self) -> u8 {
        match (self.position_in_allele, self.current.as_ref()) {
            (Some(offset), Some(allele)) => allele.nucleotides()[offset],
            _ => {
                if self.template_position < 0 {
                    UNKNOWN_BASE
                } else {
                    self.template.get(self.template_position as usize)
                        .copied()
                        .unwrap_or(UNKNOWN_BASE)
                }
            }
        }
    }

    /// Returns true if the automaton is currently reading from the template
    pub fn is_on_template(&self) -> bool {
        self.position_in_allele.is_none()
    }

    /// Returns true if this haplotype needs to see more variants before it is safe to advance.
    /// That is the case when nothing is queued, or when the last base of the current allele has been reached and nothing non-empty is queued behind it.
    pub fn wants_future_variant_bases(&self) -> bool {
        let Some(current) = self.current.as_ref() else {
            return true;
        };
        if let Some(offset) = self.position_in_allele {
            if offset + 1 < current.len() {
                return false;
            }
        }
        self.pending.iter().all(|a| a.is_empty())
    }

    /// Jumps directly to a template position, which must be ahead of the current one
    /// # Arguments
    /// * `position` - the template position to land on
    /// # Errors
    /// * if the automaton is currently inside an allele
    pub fn move_forward(&mut self, position: i64) -> Result<(), ReplayError> {
        if !self.is_on_template() {
            return Err(ReplayError::MoveInsideAllele { position: self.template_position });
        }
        debug_assert!(position > self.template_position);
        self.template_position = position - 1;
        self.next()
    }

    /// Drops any current and queued alleles so that the haplotype reads the template only.
    /// Only used when a region is abandoned as too complex.
    pub fn abandon_pending(&mut self) {
        self.current = None;
        self.pending.clear();
        self.position_in_allele = None;
    }

    /// Per-base equality with another haplotype.
    /// A finished haplotype matches anything still on the template, but not bases inserted past its end.
    pub fn matches(&self, other: &HaplotypePlayback) -> bool {
        match (self.finished, other.finished) {
            (true, true) => true,
            (true, false) => other.is_on_template(),
            (false, true) => self.is_on_template(),
            (false, false) => self.nt() == other.nt()
        }
    }

    // getters
    pub fn template_position(&self) -> i64 {
        self.template_position
    }

    pub fn current_allele(&self) -> Option<&Allele> {
        self.current.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn template(&self) -> &Arc<[u8]> {
        &self.template
    }
}

impl Ord for HaplotypePlayback {
    fn cmp(&self, other: &Self) -> Ordering {
        self.template_position.cmp(&other.template_position)
            .then_with(|| self.current.cmp(&other.current))
            .then_with(|| self.position_in_allele.cmp(&other.position_in_allele))
            .then_with(|| self.pending.cmp(&other.pending))
    }
}

impl PartialOrd for HaplotypePlayback {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Equality is replay-state equality, independent of how the state was reached
impl PartialEq for HaplotypePlayback {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HaplotypePlayback {}

impl fmt::Display for HaplotypePlayback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let in_position = self.position_in_allele.map(|p| p as i64).unwrap_or(-1);
        write!(f, "HaplotypePlayback: position={} inPosition={in_position} current:", self.template_position)?;
        match self.current.as_ref() {
            Some(a) => write!(f, "{a}")?,
            None => write!(f, "None")?
        };
        write!(f, " future:[")?;
        for (i, a) in self.pending.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{a}")?;
        }
        write!(f, "]")
    }
}
