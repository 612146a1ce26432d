//! etmorf
//!
//! User-facing façade over `etmorf-core`: loads the dictionary set from a
//! directory, hands out pipelines, and exposes the simpler consumers
//! (speller, syllabifier, synthesizer) behind one handle.
//!
//! The dictionary directory follows the conventional names:
//! - `et.dct` - main dictionary (required)
//! - `et3.dct` - tag-trigram disambiguation model (optional)
//! - `et.usr.dct` - plain-text user dictionary (optional)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use etmorf_core::error::Result;
use etmorf_core::{
    speller, syllable, Dictionary, Flags, Pipeline, Synthesizer, TrigramModel, UserDict,
};

/// Conventional file names inside a dictionary directory.
pub const MAIN_DICT: &str = "et.dct";
pub const T3_MODEL: &str = "et3.dct";
pub const USER_DICT: &str = "et.usr.dct";

/// Loaded engine; cheap to clone, shares everything.
#[derive(Clone)]
pub struct Engine {
    dict: Arc<Dictionary>,
    model: Option<Arc<TrigramModel>>,
    user: Option<Arc<UserDict>>,
    flags: Flags,
}

impl Engine {
    /// Open the dictionaries found in `dir`.
    ///
    /// The main dictionary is required; the model and the user dictionary
    /// are picked up when present. Disambiguation without a model file is
    /// a configuration error.
    pub fn open(dir: impl AsRef<Path>, flags: Flags) -> Result<Engine> {
        let dir = dir.as_ref();
        let dict = Arc::new(Dictionary::load(dir.join(MAIN_DICT))?);

        let model_path: PathBuf = dir.join(T3_MODEL);
        let model = if model_path.exists() {
            Some(Arc::new(TrigramModel::load(&model_path)?))
        } else {
            None
        };
        if flags.disambiguate && model.is_none() {
            return Err(etmorf_core::EtmorfError::Internal {
                context: "engine-open",
                reason: format!("disambiguation requested but {} is missing", T3_MODEL),
            });
        }

        let user_path = dir.join(USER_DICT);
        let user = if user_path.exists() {
            let ud = UserDict::load(&user_path)?;
            info!(entries = ud.len(), "user dictionary loaded");
            Some(Arc::new(ud))
        } else {
            None
        };

        Ok(Engine { dict, model, user, flags })
    }

    /// Build from already-loaded parts.
    pub fn from_parts(
        dict: Arc<Dictionary>,
        model: Option<Arc<TrigramModel>>,
        user: Option<Arc<UserDict>>,
        flags: Flags,
    ) -> Engine {
        Engine { dict, model, user, flags }
    }

    /// The shared dictionary.
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dict
    }

    /// Flags the engine was opened with.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// A fresh pipeline over the shared dictionaries.
    ///
    /// Pipelines are single-threaded; make one per worker.
    pub fn pipeline(&self) -> Pipeline {
        let mut p = Pipeline::new(self.dict.clone(), self.flags.clone());
        if let Some(model) = &self.model {
            p = p.with_model(model.clone());
        }
        if let Some(user) = &self.user {
            p = p.with_userdict(user.clone());
        }
        p
    }

    /// Run a whole token sequence through one pipeline.
    pub fn run<'a>(
        &self,
        tokens: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<etmorf_core::Lyli>> {
        let mut pipeline = self.pipeline();
        let mut out = Vec::new();
        for token in tokens {
            pipeline.set(token)?;
            while let Some(lyli) = pipeline.get()? {
                out.push(lyli);
            }
        }
        out.extend(pipeline.flush()?);
        Ok(out)
    }

    /// Spell check one word.
    pub fn spell(&self, word: &str) -> bool {
        speller::spell(&self.dict, self.user.as_deref(), word, &self.flags)
    }

    /// Correction suggestions for one word.
    pub fn suggest(&self, word: &str, limit: usize) -> Vec<String> {
        speller::suggest(&self.dict, self.user.as_deref(), word, limit, &self.flags)
    }

    /// Syllabify one word.
    pub fn syllabify(&self, word: &str) -> Vec<syllable::Syllable> {
        syllable::syllabify(word)
    }

    /// Synthesizer over the shared dictionary.
    pub fn synthesizer(&self) -> Result<Synthesizer<'_>> {
        Synthesizer::new(&self.dict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etmorf_core::dictionary::{DictionaryBuilder, StemRecord};

    fn write_sample_dict(dir: &Path) {
        let mut b = DictionaryBuilder::new();
        let g = b.group(&[("0", "sg n,"), ("le", "sg all,")]);
        b.stem(
            "kass",
            StemRecord {
                pos: 'S',
                ending_group: g,
                stem_class: 1,
                junction: 0,
                stress: 0,
                paradigm: 0,
                compound_flags: 0,
                root: None,
            },
        );
        b.write_all(dir.join(MAIN_DICT)).unwrap();
    }

    #[test]
    fn open_requires_main_dictionary() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Engine::open(dir.path(), Flags::default()).is_err());
        write_sample_dict(dir.path());
        assert!(Engine::open(dir.path(), Flags::default()).is_ok());
    }

    #[test]
    fn disambiguation_without_model_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_dict(dir.path());
        let flags = Flags { disambiguate: true, ..Flags::default() };
        assert!(Engine::open(dir.path(), flags).is_err());
    }

    #[test]
    fn run_analyzes_a_token_stream() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_dict(dir.path());
        let engine = Engine::open(dir.path(), Flags::default()).unwrap();
        let out = engine.run(["kass", "kassle"]).unwrap();
        let sets: Vec<_> = out.iter().filter_map(|l| l.analysis()).collect();
        assert_eq!(sets.len(), 2);
        assert!(sets[0].has_result());
        assert!(sets[1].has_result());
    }
}
