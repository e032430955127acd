//! Built-in familiar-word list.
//!
//! Words with two or more syllables drawn from the Dale-Chall list of words
//! familiar to fourth-grade readers. Single-syllable words are never
//! difficult, so they are omitted.

pub(super) const EASY_WORDS: &[&str] = &[
    "able", "about", "above", "across", "after", "afternoon", "again", "against", "airplane",
    "alive", "almost", "alone", "along", "already", "also", "always", "among", "angel", "angry",
    "animal", "another", "answer", "any", "anybody", "anyone", "anything", "anyway", "anywhere",
    "apple", "around", "arrive", "asleep", "away", "baby", "balloon", "basket", "beautiful",
    "became", "because", "become", "bedroom", "before", "began", "begin", "behind", "believe",
    "belong", "below", "beside", "better", "between", "bicycle", "birthday", "blanket", "body",
    "bottle", "bottom", "brother", "bucket", "bunny", "busy", "butter", "button", "candle",
    "candy", "careful", "carry", "castle", "center", "chicken", "children", "circle", "city",
    "clever", "closet", "coffee", "color", "coming", "corner", "cotton", "country", "cousin",
    "cover", "crazy", "daddy", "dancing", "danger", "daughter", "decide", "dinner", "doctor",
    "dollar", "done", "dragon", "dreamer", "during", "early", "easy", "eighteen", "either",
    "eleven", "empty", "enemy", "enjoy", "enough", "even", "evening", "ever", "every",
    "everybody", "everyone", "everything", "everywhere", "eyes", "family", "famous", "father",
    "favorite", "feather", "fellow", "fever", "fifteen", "finger", "finish", "flower", "follow",
    "forever", "forget", "forgive", "forgot", "forty", "funny", "future", "garden", "gentle",
    "getting", "giant", "ginger", "given", "going", "golden", "gonna", "gotta", "grandma",
    "grandpa", "happen", "happy", "heavy", "hello", "hidden", "holiday", "honey", "horses",
    "hundred", "hungry", "hurry", "idea", "inside", "instead", "island", "jacket", "jelly",
    "kitchen", "kitten", "ladder", "lady", "later", "lazy", "lemon", "lesson", "letter", "listen",
    "little", "lonely", "lovely", "lucky", "machine", "maybe", "middle", "minute", "mirror",
    "mister", "moment", "money", "monkey", "morning", "mother", "mountain", "music", "myself",
    "narrow", "nearly", "needle", "never", "nobody", "nothing", "number", "ocean", "office",
    "often", "only", "open", "orange", "other", "outside", "over", "paper", "party", "people",
    "perhaps", "person", "picture", "pillow", "pocket", "pony", "pretty", "promise", "puppy",
    "quarter", "quiet", "quickly", "rabbit", "rainbow", "ready", "really", "remember", "ribbon",
    "river", "rocket", "rosy", "seven", "shadow", "shoulder", "silent", "silver", "simple",
    "sister", "sixteen", "sleepy", "slowly", "somebody", "someone", "something", "sometime",
    "sometimes", "somewhere", "sorry", "spider", "spirit", "spoken", "started", "station",
    "story", "stranger", "summer", "sunny", "sunshine", "supper", "surprise", "sweater",
    "table", "taken", "teacher", "thirty", "thousand", "tiger", "today", "together", "tomorrow",
    "tonight", "towards", "travel", "trouble", "turkey", "under", "until", "upon", "useful",
    "very", "village", "visit", "waited", "wagon", "walking", "water", "wedding", "whatever",
    "whenever", "whisper", "window", "winter", "within", "without", "woman", "women", "wonder",
    "wonderful", "wooden", "yellow", "yesterday", "zero",
];
