use std::collections::{BTreeMap, HashMap};

use crate::shared::geo::Coord;

/// One ranked hit out of a [`SearchIndex`] scan. `house_number` and `coord`
/// are only populated by the address search path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlQuality {
    pub idx: u32,
    /// Ranking score in [0, 100], higher is better.
    pub quality: i32,
    pub house_number: Option<u32>,
    pub coord: Option<Coord>,
}

#[derive(Debug, Clone, Copy)]
struct Posting {
    idx: u32,
    /// Position of the word within the stored name, capped.
    position: u8,
}

/// Inverted index over the names of one entity type.
///
/// Built once per snapshot; queries look terms up in a sorted map so that
/// prefix matching is a range scan. Entity indices are the positions of the
/// names in the build iterator, matching the entity array's `idx` order.
#[derive(Debug, Default, Clone)]
pub struct SearchIndex {
    terms: BTreeMap<String, Vec<Posting>>,
    /// Number of indexed words per entity.
    word_counts: Box<[u16]>,
}

impl SearchIndex {
    pub fn build<'a>(names: impl Iterator<Item = &'a str>) -> Self {
        let mut terms: BTreeMap<String, Vec<Posting>> = BTreeMap::new();
        let mut word_counts = Vec::new();
        for (idx, name) in names.enumerate() {
            let words = tokenize(name);
            word_counts.push(words.len() as u16);
            for (position, word) in words.into_iter().enumerate() {
                let postings = terms.entry(word).or_default();
                // Keep the first occurrence only; it has the best position.
                if postings.last().is_none_or(|p| p.idx != idx as u32) {
                    postings.push(Posting {
                        idx: idx as u32,
                        position: position.min(u8::MAX as usize) as u8,
                    });
                }
            }
        }
        Self {
            terms,
            word_counts: word_counts.into(),
        }
    }

    /// Finds entities whose name contains every query token as a whole word,
    /// ranked by quality. The admin `filter` runs during selection so
    /// filtered-out candidates never compete for the `nbmax` slots.
    pub fn find_complete(
        &self,
        q: &str,
        alias: &HashMap<String, String>,
        synonyms: &HashMap<String, Vec<String>>,
        word_weight: i32,
        nbmax: usize,
        filter: impl Fn(u32) -> bool,
    ) -> Vec<FlQuality> {
        self.find(q, alias, synonyms, word_weight, nbmax, false, filter)
    }

    /// Like [`SearchIndex::find_complete`] but the last query token may match
    /// a word prefix, for as-you-type completion.
    pub fn find_partial_with_pattern(
        &self,
        q: &str,
        alias: &HashMap<String, String>,
        synonyms: &HashMap<String, Vec<String>>,
        word_weight: i32,
        nbmax: usize,
        filter: impl Fn(u32) -> bool,
    ) -> Vec<FlQuality> {
        self.find(q, alias, synonyms, word_weight, nbmax, true, filter)
    }

    /// Does the query look like a street address? True when a token is a
    /// number or belongs to the alias/synonym maps, which carry the address
    /// vocabulary ("bd", "av", ...).
    pub fn is_address_type(
        &self,
        q: &str,
        alias: &HashMap<String, String>,
        synonyms: &HashMap<String, Vec<String>>,
    ) -> bool {
        tokenize(q).iter().any(|token| {
            token.chars().all(|c| c.is_ascii_digit())
                || alias.contains_key(token)
                || synonyms.contains_key(token)
        })
    }

    fn find(
        &self,
        q: &str,
        alias: &HashMap<String, String>,
        synonyms: &HashMap<String, Vec<String>>,
        word_weight: i32,
        nbmax: usize,
        partial: bool,
        filter: impl Fn(u32) -> bool,
    ) -> Vec<FlQuality> {
        let tokens = tokenize(q);
        if tokens.is_empty() {
            return Vec::new();
        }

        // idx -> earliest matched word position
        let mut candidates: Option<HashMap<u32, u8>> = None;
        let last = tokens.len() - 1;
        for (i, token) in tokens.iter().enumerate() {
            let prefix = partial && i == last;
            let matched = self.match_token(token, prefix, alias, synonyms);
            candidates = Some(match candidates {
                None => matched,
                Some(previous) => previous
                    .into_iter()
                    .filter_map(|(idx, pos)| {
                        matched.get(&idx).map(|p| (idx, pos.min(*p)))
                    })
                    .collect(),
            });
            if candidates.as_ref().is_some_and(HashMap::is_empty) {
                return Vec::new();
            }
        }

        let mut hits: Vec<(u32, u8)> = candidates.unwrap_or_default().into_iter().collect();
        hits.sort_unstable();

        let mut result: Vec<FlQuality> = hits
            .into_iter()
            .filter(|(idx, _)| filter(*idx))
            .map(|(idx, first_position)| {
                let extra_words =
                    (self.word_counts[idx as usize] as i32 - tokens.len() as i32).max(0);
                let quality = 100 - word_weight * extra_words - (first_position as i32).min(5);
                FlQuality {
                    idx,
                    quality: quality.clamp(0, 100),
                    house_number: None,
                    coord: None,
                }
            })
            .collect();

        result.sort_by(|a, b| b.quality.cmp(&a.quality).then(a.idx.cmp(&b.idx)));
        result.truncate(nbmax);
        result
    }

    /// All entities matching one token, after alias rewrite and synonym
    /// expansion. A token matches if any of its alternatives matches.
    fn match_token(
        &self,
        token: &str,
        prefix: bool,
        alias: &HashMap<String, String>,
        synonyms: &HashMap<String, Vec<String>>,
    ) -> HashMap<u32, u8> {
        let rewritten = alias.get(token).map(String::as_str).unwrap_or(token);
        let mut alternatives: Vec<&str> = vec![rewritten];
        if let Some(expansions) = synonyms.get(rewritten) {
            alternatives.extend(expansions.iter().map(String::as_str));
        }

        let mut matched: HashMap<u32, u8> = HashMap::new();
        for alt in alternatives {
            let postings = if prefix {
                self.prefix_postings(alt)
            } else {
                self.terms.get(alt).into_iter().flatten().copied().collect()
            };
            for posting in postings {
                matched
                    .entry(posting.idx)
                    .and_modify(|p| *p = (*p).min(posting.position))
                    .or_insert(posting.position);
            }
        }
        matched
    }

    fn prefix_postings(&self, prefix: &str) -> Vec<Posting> {
        self.terms
            .range(prefix.to_string()..)
            .take_while(|(term, _)| term.starts_with(prefix))
            .flat_map(|(_, postings)| postings.iter().copied())
            .collect()
    }
}

/// Lowercases, folds accents and splits on anything that is not
/// alphanumeric.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(fold_char)
        .collect::<String>()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_owned)
        .collect()
}

const fn fold_char(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => c,
    }
}

#[test]
fn tokenize_folds_and_splits() {
    assert_eq!(tokenize("Gare de l'Est"), vec!["gare", "de", "l", "est"]);
    assert_eq!(tokenize("Châtelet—Les Halles"), vec!["chatelet", "les", "halles"]);
    assert_eq!(tokenize("  "), Vec::<String>::new());
}

#[test]
fn complete_requires_every_token() {
    let index = SearchIndex::build(["gare de lyon", "gare du nord", "place de lyon"].into_iter());
    let empty = HashMap::new();
    let none = HashMap::new();
    let hits = index.find_complete("gare lyon", &empty, &none, 5, 10, |_| true);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].idx, 0);
}

#[test]
fn partial_matches_last_token_prefix() {
    let index = SearchIndex::build(["gare de lyon", "gare du nord"].into_iter());
    let empty = HashMap::new();
    let none = HashMap::new();
    let hits = index.find_partial_with_pattern("gare ly", &empty, &none, 5, 10, |_| true);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].idx, 0);
    // whole-word mode must not prefix-match
    let hits = index.find_complete("gare ly", &empty, &none, 5, 10, |_| true);
    assert!(hits.is_empty());
}

#[test]
fn extra_stored_words_cost_word_weight() {
    let index = SearchIndex::build(["lyon", "lyon part dieu"].into_iter());
    let empty = HashMap::new();
    let none = HashMap::new();
    let hits = index.find_complete("lyon", &empty, &none, 5, 10, |_| true);
    assert_eq!(hits[0].idx, 0);
    assert_eq!(hits[0].quality, 100);
    assert_eq!(hits[1].idx, 1);
    assert_eq!(hits[1].quality, 90);
}

#[test]
fn alias_and_synonyms_expand_tokens() {
    let index = SearchIndex::build(["boulevard saint michel"].into_iter());
    let mut alias = HashMap::new();
    alias.insert("bd".to_owned(), "boulevard".to_owned());
    let mut synonyms = HashMap::new();
    synonyms.insert("st".to_owned(), vec!["saint".to_owned()]);
    let hits = index.find_complete("bd st michel", &alias, &synonyms, 5, 10, |_| true);
    assert_eq!(hits.len(), 1);
}

#[test]
fn address_type_detection() {
    let index = SearchIndex::build(std::iter::empty());
    let mut alias = HashMap::new();
    alias.insert("av".to_owned(), "avenue".to_owned());
    let synonyms = HashMap::new();
    assert!(index.is_address_type("10 faubourg", &alias, &synonyms));
    assert!(index.is_address_type("av foch", &alias, &synonyms));
    assert!(!index.is_address_type("gare de lyon", &alias, &synonyms));
}
