use std::{collections::HashMap, fs, io, path::{Path, PathBuf}};

/// Valence lexicon mapping lowercase tokens to a mean rating in `[-4, 4]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentimentLexicon {
    valences: HashMap<String, f64>,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum LexiconError {
    #[display("failed to read lexicon file {}", path.display())]
    Io {
        path: PathBuf,
        source: io::Error,
    },
    #[display("malformed lexicon entry on line {line}")]
    Malformed { line: usize },
}

impl SentimentLexicon {
    /// Lexicon compiled into the binary.
    ///
    /// Covers common affective English vocabulary; load a full VADER lexicon
    /// file with [`SentimentLexicon::load`] for complete coverage.
    #[must_use]
    pub fn builtin() -> Self {
        let valences = BUILTIN_LEXICON
            .iter()
            .map(|&(token, valence)| (token.to_owned(), valence))
            .collect();
        Self { valences }
    }

    /// Parses VADER-format text: `token<TAB>mean<TAB>...` per line.
    ///
    /// Blank lines are skipped; columns after the mean are ignored.
    pub fn parse(text: &str) -> Result<Self, LexiconError> {
        let mut valences = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(token), Some(mean)) = (fields.next(), fields.next()) else {
                return Err(LexiconError::Malformed { line: idx + 1 });
            };
            let mean = mean
                .trim()
                .parse::<f64>()
                .map_err(|_| LexiconError::Malformed { line: idx + 1 })?;
            valences.insert(token.trim().to_lowercase(), mean);
        }
        Ok(Self { valences })
    }

    pub fn load<P>(path: P) -> Result<Self, LexiconError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    #[must_use]
    pub fn get(&self, token: &str) -> Option<f64> {
        self.valences.get(token).copied()
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.valences.contains_key(token)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.valences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }
}

pub(super) const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't", "aren't",
    "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt", "havent",
    "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't", "isn't",
    "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing",
    "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent", "oughtn't", "shan't",
    "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont", "wouldnt", "won't", "wouldn't",
    "rarely", "seldom", "despite",
];

/// Intensifiers (positive) and dampeners (negative).
pub(super) const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", 0.293),
    ("amazingly", 0.293),
    ("awfully", 0.293),
    ("completely", 0.293),
    ("considerably", 0.293),
    ("decidedly", 0.293),
    ("deeply", 0.293),
    ("enormously", 0.293),
    ("entirely", 0.293),
    ("especially", 0.293),
    ("exceptionally", 0.293),
    ("extremely", 0.293),
    ("fabulously", 0.293),
    ("fully", 0.293),
    ("greatly", 0.293),
    ("highly", 0.293),
    ("hugely", 0.293),
    ("incredibly", 0.293),
    ("intensely", 0.293),
    ("majorly", 0.293),
    ("more", 0.293),
    ("most", 0.293),
    ("particularly", 0.293),
    ("purely", 0.293),
    ("quite", 0.293),
    ("really", 0.293),
    ("remarkably", 0.293),
    ("so", 0.293),
    ("substantially", 0.293),
    ("thoroughly", 0.293),
    ("totally", 0.293),
    ("tremendously", 0.293),
    ("uber", 0.293),
    ("unbelievably", 0.293),
    ("unusually", 0.293),
    ("utterly", 0.293),
    ("very", 0.293),
    ("almost", -0.293),
    ("barely", -0.293),
    ("hardly", -0.293),
    ("just enough", -0.293),
    ("kind of", -0.293),
    ("kinda", -0.293),
    ("kindof", -0.293),
    ("less", -0.293),
    ("little", -0.293),
    ("marginally", -0.293),
    ("occasionally", -0.293),
    ("partly", -0.293),
    ("scarcely", -0.293),
    ("slightly", -0.293),
    ("somewhat", -0.293),
    ("sort of", -0.293),
    ("sorta", -0.293),
    ("sortof", -0.293),
];

const BUILTIN_LEXICON: &[(&str, f64)] = &[
    ("abandon", -1.9),
    ("abandoned", -2.0),
    ("ache", -1.6),
    ("aching", -2.0),
    ("admire", 2.1),
    ("adore", 2.6),
    ("adored", 2.9),
    ("afraid", -2.2),
    ("agony", -1.8),
    ("alive", 1.6),
    ("alone", -1.0),
    ("amazing", 2.8),
    ("anger", -2.7),
    ("angry", -2.3),
    ("anxious", -1.0),
    ("ashamed", -2.1),
    ("awful", -2.0),
    ("bad", -2.5),
    ("beautiful", 2.9),
    ("best", 3.2),
    ("betray", -3.2),
    ("betrayed", -3.0),
    ("bitter", -1.8),
    ("bleed", -1.4),
    ("bless", 1.8),
    ("blessed", 2.9),
    ("bliss", 2.7),
    ("blood", -0.6),
    ("blue", -0.2),
    ("bored", -1.1),
    ("brave", 2.4),
    ("bright", 1.9),
    ("broke", -1.8),
    ("broken", -2.1),
    ("burn", -0.6),
    ("burning", -0.8),
    ("calm", 1.3),
    ("care", 2.2),
    ("careless", -1.5),
    ("charm", 1.7),
    ("charming", 2.8),
    ("cheat", -2.0),
    ("cheated", -1.9),
    ("cheer", 2.3),
    ("cherish", 1.6),
    ("clever", 2.0),
    ("cold", -0.7),
    ("comfort", 1.5),
    ("cried", -1.6),
    ("cruel", -2.8),
    ("crush", -0.6),
    ("cry", -2.1),
    ("crying", -2.1),
    ("curse", -2.5),
    ("damn", -1.7),
    ("danger", -2.4),
    ("dark", -1.4),
    ("darling", 2.8),
    ("dead", -3.3),
    ("dear", 1.6),
    ("death", -2.9),
    ("delight", 2.9),
    ("depressed", -2.3),
    ("desire", 1.7),
    ("despair", -1.3),
    ("destroy", -2.5),
    ("destroyed", -3.0),
    ("die", -2.9),
    ("died", -2.6),
    ("dirty", -1.9),
    ("doubt", -1.5),
    ("dream", 1.0),
    ("dreams", 1.7),
    ("dumb", -2.3),
    ("empty", -0.8),
    ("enemy", -2.5),
    ("enjoy", 2.2),
    ("evil", -3.4),
    ("excited", 1.4),
    ("fail", -2.5),
    ("failed", -2.3),
    ("fair", 1.3),
    ("fake", -2.1),
    ("fall", -0.8),
    ("fear", -2.2),
    ("fearless", 1.9),
    ("fight", -1.6),
    ("fine", 0.8),
    ("fool", -1.9),
    ("forget", -0.9),
    ("forgive", 1.1),
    ("forgotten", -0.9),
    ("free", 2.3),
    ("freedom", 3.2),
    ("friend", 2.2),
    ("friends", 2.1),
    ("fun", 2.3),
    ("funny", 1.9),
    ("gentle", 1.9),
    ("ghost", -1.3),
    ("glad", 2.0),
    ("glory", 2.3),
    ("god", 1.1),
    ("gold", 1.2),
    ("golden", 1.3),
    ("good", 1.9),
    ("gorgeous", 3.0),
    ("grace", 1.8),
    ("great", 3.1),
    ("grief", -2.2),
    ("guilty", -1.8),
    ("happiness", 2.6),
    ("happy", 2.7),
    ("hate", -2.7),
    ("hated", -3.2),
    ("haunted", -1.7),
    ("heal", 1.4),
    ("heartbreak", -2.7),
    ("heartbroken", -3.3),
    ("heaven", 2.3),
    ("hell", -3.6),
    ("help", 1.7),
    ("honest", 2.3),
    ("hope", 1.9),
    ("hopeless", -2.0),
    ("hurt", -2.4),
    ("hurting", -2.4),
    ("hurts", -2.1),
    ("innocent", 1.4),
    ("jealous", -2.0),
    ("joke", 1.2),
    ("joy", 2.8),
    ("kill", -3.7),
    ("killed", -3.5),
    ("kind", 2.4),
    ("kiss", 1.8),
    ("kissed", 1.6),
    ("laugh", 2.6),
    ("laughing", 2.2),
    ("liar", -3.1),
    ("lie", -1.4),
    ("lies", -1.8),
    ("like", 2.0),
    ("lonely", -1.5),
    ("lose", -1.6),
    ("losing", -1.6),
    ("lost", -1.3),
    ("love", 3.2),
    ("loved", 2.9),
    ("lover", 2.8),
    ("loves", 2.7),
    ("loving", 2.9),
    ("lucky", 1.8),
    ("mad", -2.2),
    ("magic", 1.4),
    ("mean", -1.2),
    ("mess", -1.5),
    ("miss", -0.6),
    ("missing", -1.2),
    ("mistake", -1.4),
    ("nice", 1.8),
    ("no", -1.2),
    ("pain", -2.3),
    ("painful", -1.9),
    ("paradise", 3.2),
    ("peace", 2.5),
    ("perfect", 2.7),
    ("please", 1.3),
    ("pretty", 2.2),
    ("pride", 1.4),
    ("promise", 1.3),
    ("proud", 2.1),
    ("rage", -2.6),
    ("regret", -1.8),
    ("revenge", -2.4),
    ("rich", 2.6),
    ("romance", 2.6),
    ("romantic", 1.7),
    ("sad", -2.1),
    ("sadness", -1.9),
    ("safe", 1.9),
    ("scared", -1.9),
    ("scream", -1.7),
    ("screaming", -1.6),
    ("shame", -2.1),
    ("shine", 1.6),
    ("sick", -2.3),
    ("sin", -2.6),
    ("smile", 1.5),
    ("smiling", 1.6),
    ("sorrow", -2.4),
    ("sorry", -0.3),
    ("special", 1.7),
    ("stolen", -2.2),
    ("strong", 2.3),
    ("stupid", -2.4),
    ("suffer", -2.5),
    ("sunshine", 2.2),
    ("sweet", 2.0),
    ("tears", -0.9),
    ("tender", 1.3),
    ("terrible", -2.1),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("tired", -1.9),
    ("treasure", 1.2),
    ("trouble", -1.7),
    ("true", 1.7),
    ("trust", 2.3),
    ("ugly", -2.3),
    ("unhappy", -1.8),
    ("war", -2.9),
    ("warm", 0.9),
    ("weak", -1.9),
    ("wicked", -2.4),
    ("win", 2.8),
    ("winning", 2.4),
    ("wish", 1.7),
    ("wonderful", 2.7),
    ("worry", -1.9),
    ("worse", -2.1),
    ("worst", -3.1),
    ("wound", -1.9),
    ("wrong", -2.1),
    ("yes", 1.7),
    ("young", 0.8),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vader_format() {
        let lexicon =
            SentimentLexicon::parse("good\t1.9\t0.9\t[2, 2]\n\nBad\t-2.5\t0.5\t[]\n").unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.get("good"), Some(1.9));
        assert_eq!(lexicon.get("bad"), Some(-2.5));
    }

    #[test]
    fn test_parse_rejects_malformed_line() {
        let err = SentimentLexicon::parse("good\t1.9\nbroken\n").unwrap_err();
        assert!(matches!(err, LexiconError::Malformed { line: 2 }));
        let err = SentimentLexicon::parse("good\tgreat\n").unwrap_err();
        assert!(matches!(err, LexiconError::Malformed { line: 1 }));
    }

    #[test]
    fn test_builtin_has_no_duplicates() {
        assert_eq!(SentimentLexicon::builtin().len(), BUILTIN_LEXICON.len());
    }
}
