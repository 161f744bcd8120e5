use crate::error::{IndexError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

/// Turns raw text into the ordered sequence of index terms.
///
/// The same normalizer must be used when inserting documents and when
/// searching, otherwise query terms will not match indexed terms.
pub trait TextNormalizer {
    fn normalize(&self, text: &str) -> Vec<String>;
}

impl<T: TextNormalizer + ?Sized> TextNormalizer for &T {
    fn normalize(&self, text: &str) -> Vec<String> { (**self).normalize(text) }
}

impl<T: TextNormalizer + ?Sized> TextNormalizer for Box<T> {
    fn normalize(&self, text: &str) -> Vec<String> { (**self).normalize(text) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Russian,
}

impl Language {
    fn algorithm(self) -> Algorithm {
        match self {
            Language::English => Algorithm::English,
            Language::Russian => Algorithm::Russian,
        }
    }

    fn stopwords(self) -> &'static HashSet<&'static str> {
        match self {
            Language::English => &ENGLISH_STOPWORDS,
            Language::Russian => &RUSSIAN_STOPWORDS,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::English => "english",
            Language::Russian => "russian",
        })
    }
}

impl FromStr for Language {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "russian" | "ru" => Ok(Language::Russian),
            other => Err(IndexError::InvalidArgument(format!(
                "unsupported language {other:?}, expected \"english\" or \"russian\""
            ))),
        }
    }
}

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref RUSSIAN_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "и","в","во","не","что","он","на","я","с","со","как","а","то","все","она","так","его","но","да","ты",
            "к","у","же","вы","за","бы","по","только","ее","мне","было","вот","от","меня","еще","нет","о","из",
            "ему","теперь","когда","даже","ну","вдруг","ли","если","уже","или","ни","быть","был","него","до",
            "вас","нибудь","опять","уж","вам","ведь","там","потом","себя","ничего","ей","может","они","тут",
            "где","есть","надо","ней","для","мы","тебя","их","чем","была","сам","чтоб","без","будто","чего",
            "раз","тоже","себе","под","будет","ж","тогда","кто","этот","того","потому","этого","какой",
            "совсем","ним","здесь","этом","один","почти","мой","тем","чтобы","нее","сейчас","были","куда",
            "зачем","всех","никогда","можно","при","наконец","два","об","другой","хоть","после","над",
            "больше","тот","через","эти","нас","про","всего","них","какая","много","разве","три","эту",
            "моя","впрочем","хорошо","свою","этой","перед","иногда","лучше","чуть","том","нельзя","такой",
            "им","более","всегда","конечно","всю","между","который","которые","которых"
        ];
        words.iter().copied().collect()
    };
}

/// NFKC, lowercase, alphanumeric runs, Snowball stemming and stopword removal.
pub struct StandardNormalizer {
    language: Language,
    stemmer: Stemmer,
}

impl StandardNormalizer {
    pub fn new(language: Language) -> Self {
        Self { language, stemmer: Stemmer::create(language.algorithm()) }
    }

    pub fn language(&self) -> Language { self.language }

    fn is_stopword(&self, token: &str) -> bool { self.language.stopwords().contains(token) }
}

impl Default for StandardNormalizer {
    fn default() -> Self { Self::new(Language::Russian) }
}

impl TextNormalizer for StandardNormalizer {
    fn normalize(&self, text: &str) -> Vec<String> {
        let mut normalized = text.nfkc().collect::<String>().to_lowercase();
        if self.language == Language::Russian {
            normalized = normalized.replace('ё', "е");
        }
        let mut terms = Vec::new();
        for mat in TOKEN_RE.find_iter(&normalized) {
            let token = mat.as_str();
            if self.is_stopword(token) { continue; }
            let stem = self.stemmer.stem(token);
            if self.is_stopword(&stem) { continue; }
            terms.push(stem.into_owned());
        }
        terms
    }
}

/// Lowercases and splits on anything that is not alphanumeric. No stemming,
/// no stopwords; terms are exactly the words of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleNormalizer;

impl TextNormalizer for SimpleNormalizer {
    fn normalize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect()
    }
}
