//! Cooperative token pipeline.
//!
//! Single-threaded per document stream: the caller feeds tokens with
//! [`Pipeline::set`], drains results with [`Pipeline::get`] and
//! [`Pipeline::flush`]. Words are analyzed once enough context is queued
//! (three words for plain morphology, a complete sentence when
//! disambiguation is on); structural tags pass through in order.
//! Multi-word merges shorten the stream without reordering it.
//!
//! The dictionary and model are shared, read-only; a pipeline instance
//! itself is not. Callers wanting parallelism run one pipeline per
//! thread over the same `Arc`ed dictionary.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;
use unicode_normalization::UnicodeNormalization;

use crate::analysis::AnalysisSet;
use crate::analyzer;
use crate::dictionary::Dictionary;
use crate::disambiguator;
use crate::error::{BadInputReason, EtmorfError, Result};
use crate::flags::Flags;
use crate::guesser;
use crate::propername;
use crate::tags;
use crate::token::{Lyli, TagKind};
use crate::trigram::TrigramModel;
use crate::userdict::UserDict;

/// Words kept queued before plain morphology starts draining; leaves
/// room for multi-word lookahead.
const MORPH_CONTEXT: usize = 3;

/// One analysis pipeline instance.
pub struct Pipeline {
    dict: Arc<Dictionary>,
    model: Option<Arc<TrigramModel>>,
    user: Option<Arc<UserDict>>,
    flags: Flags,
    queue: VecDeque<Lyli>,
    out: VecDeque<Lyli>,
    pending_words: usize,
    in_sentence: bool,
    ignore_block: bool,
    token_index: usize,
    cache: LruCache<String, AnalysisSet>,
}

impl Pipeline {
    /// New pipeline over a shared dictionary.
    pub fn new(dict: Arc<Dictionary>, flags: Flags) -> Pipeline {
        let capacity = NonZeroUsize::new(flags.cache_capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Pipeline {
            dict,
            model: None,
            user: None,
            flags,
            queue: VecDeque::new(),
            out: VecDeque::new(),
            pending_words: 0,
            in_sentence: false,
            ignore_block: false,
            token_index: 0,
            cache: LruCache::new(capacity),
        }
    }

    /// Attach a disambiguation model.
    pub fn with_model(mut self, model: Arc<TrigramModel>) -> Pipeline {
        self.model = Some(model);
        self
    }

    /// Attach a user dictionary.
    pub fn with_userdict(mut self, user: Arc<UserDict>) -> Pipeline {
        self.user = Some(user);
        self
    }

    /// Flags in effect.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Feed one token; returns true when output can be drained.
    pub fn set(&mut self, text: &str) -> Result<bool> {
        self.token_index += 1;
        let text = text.trim();
        if text.is_empty() {
            return Ok(self.ready());
        }
        if self.flags.split_on_comma && text.len() > 1 && text.contains(',') {
            let mut rest = text;
            while let Some(pos) = rest.find(',') {
                let (head, tail) = rest.split_at(pos);
                if !head.is_empty() {
                    self.push_classified(head)?;
                }
                self.push_classified(",")?;
                rest = &tail[1..];
            }
            if !rest.is_empty() {
                self.push_classified(rest)?;
            }
            return Ok(self.ready());
        }
        self.push_classified(text)?;
        Ok(self.ready())
    }

    /// Next output token without forcing a partial sentence.
    pub fn get(&mut self) -> Result<Option<Lyli>> {
        self.produce(false)
    }

    /// Drain everything; an open sentence is an error the caller may
    /// recover from with [`Pipeline::clear`].
    pub fn flush(&mut self) -> Result<Vec<Lyli>> {
        let mut out = Vec::new();
        while let Some(lyli) = self.produce(true)? {
            out.push(lyli);
        }
        Ok(out)
    }

    /// Discard all pending state.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.out.clear();
        self.pending_words = 0;
        self.in_sentence = false;
        self.ignore_block = false;
    }

    fn ready(&self) -> bool {
        if self.flags.disambiguate {
            !self.in_sentence && self.queue.iter().any(|l| l.is_word())
        } else {
            self.pending_words >= MORPH_CONTEXT
        }
    }

    fn push_classified(&mut self, text: &str) -> Result<()> {
        match self.classify(text) {
            Ok(lyli) => {
                if lyli.is_word() {
                    self.pending_words += 1;
                }
                match lyli.tag_kind() {
                    Some(TagKind::Bos) => self.in_sentence = true,
                    Some(TagKind::Eos) => self.in_sentence = false,
                    _ => {}
                }
                self.queue.push_back(lyli);
                Ok(())
            }
            Err(e) if e.is_recoverable() => {
                // One bad token never poisons the pipeline: it becomes an
                // empty analysis and processing continues.
                debug!(token = text, error = %e, "bad input token");
                self.queue.push_back(Lyli::Analysis(AnalysisSet::empty(text)));
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Sort a raw token into word or structural tag.
    fn classify(&mut self, text: &str) -> Result<Lyli> {
        if self.flags.ignore_blocks {
            if self.ignore_block {
                if text == "</ignoreeri>" {
                    self.ignore_block = false;
                }
                return Ok(Lyli::StringTag(text.to_string(), TagKind::Arbitrary));
            }
            if text == "<ignoreeri>" {
                self.ignore_block = true;
                return Ok(Lyli::StringTag(text.to_string(), TagKind::Arbitrary));
            }
        }
        if self.flags.ignore_tags || self.flags.xml_input {
            if text.starts_with('<') {
                if !text.ends_with('>') {
                    return Err(EtmorfError::BadInput {
                        token_index: self.token_index,
                        reason: BadInputReason::UnbalancedMarkup,
                    });
                }
                return Ok(Lyli::tag(text));
            }
            if self.flags.xml_input && !self.in_sentence {
                // Words outside <s> pass through under the XML flag.
                return Ok(Lyli::StringTag(text.to_string(), TagKind::Arbitrary));
            }
        } else if text.starts_with('<') && text.ends_with('>') {
            let kind = TagKind::classify(text);
            if kind != TagKind::Arbitrary {
                return Ok(Lyli::StringTag(text.to_string(), kind));
            }
        }
        Ok(Lyli::Word(text.nfc().collect()))
    }

    fn produce(&mut self, force: bool) -> Result<Option<Lyli>> {
        loop {
            if let Some(lyli) = self.out.pop_front() {
                return Ok(Some(lyli));
            }
            if self.queue.is_empty() {
                return Ok(None);
            }
            if self.flags.disambiguate {
                if !self.produce_sentence(force)? {
                    return Ok(None);
                }
            } else {
                if !force && self.pending_words < MORPH_CONTEXT {
                    return Ok(None);
                }
                self.produce_word();
            }
        }
    }

    /// Move one sentence (or leading tags) from the queue to the output.
    fn produce_sentence(&mut self, force: bool) -> Result<bool> {
        // Tokens before the sentence opener pass straight through.
        while let Some(front) = self.queue.front() {
            if front.tag_kind() == Some(TagKind::Bos) {
                break;
            }
            if front.is_word() {
                // Stray word outside sentence markers: analyze standalone.
                self.produce_word();
                return Ok(true);
            }
            let lyli = self
                .queue
                .pop_front()
                .unwrap_or_else(|| unreachable!());
            self.out.push_back(lyli);
            return Ok(true);
        }
        if self.queue.is_empty() {
            return Ok(false);
        }
        let eos = self
            .queue
            .iter()
            .position(|l| l.tag_kind() == Some(TagKind::Eos));
        let Some(eos) = eos else {
            if force {
                return Err(EtmorfError::BadInput {
                    token_index: self.token_index,
                    reason: BadInputReason::IncompleteSentence,
                });
            }
            return Ok(false);
        };

        let sentence: Vec<Lyli> = self.queue.drain(..=eos).collect();
        let mut analyzed = self.analyze_sentence(sentence);
        propername::add_proper_names(&mut analyzed, &self.dict, &self.flags);
        for lyli in analyzed.iter_mut() {
            if let Some(set) = lyli.analysis_mut() {
                tags::attach_tags(set);
            }
        }
        if let Some(model) = self.model.clone() {
            disambiguator::disambiguate(&mut analyzed, &model, &self.flags);
        }
        for lyli in analyzed {
            self.out.push_back(lyli);
        }
        Ok(true)
    }

    /// Analyze all words of a drained sentence, honoring multi-word
    /// merges.
    fn analyze_sentence(&mut self, sentence: Vec<Lyli>) -> Vec<Lyli> {
        let mut out: Vec<Lyli> = Vec::with_capacity(sentence.len());
        let mut i = 0;
        while i < sentence.len() {
            match &sentence[i] {
                Lyli::Word(word) => {
                    let lookahead = following_words(&sentence[i + 1..]);
                    let set = self.analyze_word(word, &lookahead);
                    self.pending_words = self.pending_words.saturating_sub(set.span_count);
                    i += set.span_count;
                    out.push(Lyli::Analysis(set));
                }
                other => {
                    out.push(other.clone());
                    i += 1;
                }
            }
        }
        out
    }

    /// Analyze and emit the front token in plain morphology mode.
    fn produce_word(&mut self) {
        let Some(front) = self.queue.pop_front() else { return };
        match front {
            Lyli::Word(word) => {
                let lookahead = following_words_deque(&self.queue);
                let set = self.analyze_word(&word, &lookahead);
                for _ in 1..set.span_count {
                    self.queue.pop_front();
                }
                self.pending_words = self.pending_words.saturating_sub(set.span_count);
                self.out.push_back(Lyli::Analysis(set));
            }
            other => self.out.push_back(other),
        }
    }

    /// User dictionary, multi-word merge, main dictionary, guesser.
    fn analyze_word(&mut self, word: &str, lookahead: &[String]) -> AnalysisSet {
        if self.flags.merge_mwe && !lookahead.is_empty() {
            let mut words: Vec<&str> = vec![word];
            words.extend(lookahead.iter().map(String::as_str));
            if let Some(mut set) = analyzer::try_mwe(&self.dict, &words, &self.flags) {
                self.decorate(&mut set);
                return set;
            }
        }
        if let Some(user) = &self.user {
            if let Some(mut set) = user.lookup(word) {
                self.decorate(&mut set);
                return set;
            }
        }
        if let Some(cached) = self.cache.get(word) {
            return cached.clone();
        }
        let mut set = analyzer::analyze(&self.dict, word, &self.flags);
        if !set.has_result() && self.flags.guess {
            set = guesser::guess(&self.dict, word, &self.flags);
        }
        self.decorate(&mut set);
        self.cache.put(word.to_string(), set.clone());
        set
    }

    fn decorate(&self, set: &mut AnalysisSet) {
        if self.flags.tag_with_dtag {
            tags::attach_tags(set);
        }
        if self.flags.add_lemmas || self.flags.lemma_only {
            set.fill_lemmas();
        }
    }
}

/// Up to two contiguous following words from a slice.
fn following_words(rest: &[Lyli]) -> Vec<String> {
    rest.iter()
        .take_while(|l| l.is_word())
        .take(2)
        .filter_map(|l| match l {
            Lyli::Word(w) => Some(w.clone()),
            _ => None,
        })
        .collect()
}

/// Up to two contiguous following words from the queue.
fn following_words_deque(queue: &VecDeque<Lyli>) -> Vec<String> {
    queue
        .iter()
        .take_while(|l| l.is_word())
        .take(2)
        .filter_map(|l| match l {
            Lyli::Word(w) => Some(w.clone()),
            _ => None,
        })
        .collect()
}
