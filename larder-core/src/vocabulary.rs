//! Closed vocabularies for ingredient units and preparations.
//!
//! Both vocabularies are fixed enums with a static synonym table mapping
//! common alternate spellings, plurals, abbreviations and base verb forms
//! onto a canonical token. Lookups go through [`normalize_token`] first, so
//! synonym keys are stored lowercase with single spaces and no trailing period.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// Broad family a unit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitGroup {
    Volume,
    Weight,
    /// Imprecise small measures ("a pinch", "a dash").
    Count,
    /// Discrete items or containers ("2 cloves", "1 can").
    Item,
}

/// Canonical measurement unit stored on an ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalUnit {
    #[serde(rename = "tsp")]
    Tsp,
    #[serde(rename = "tbsp")]
    Tbsp,
    #[serde(rename = "cup")]
    Cup,
    #[serde(rename = "ml")]
    Ml,
    #[serde(rename = "l")]
    L,
    #[serde(rename = "fl oz")]
    FlOz,
    #[serde(rename = "pint")]
    Pint,
    #[serde(rename = "quart")]
    Quart,
    #[serde(rename = "gallon")]
    Gallon,
    #[serde(rename = "g")]
    G,
    #[serde(rename = "kg")]
    Kg,
    #[serde(rename = "mg")]
    Mg,
    #[serde(rename = "oz")]
    Oz,
    #[serde(rename = "lb")]
    Lb,
    #[serde(rename = "pinch")]
    Pinch,
    #[serde(rename = "dash")]
    Dash,
    #[serde(rename = "drop")]
    Drop,
    #[serde(rename = "handful")]
    Handful,
    #[serde(rename = "splash")]
    Splash,
    #[serde(rename = "piece")]
    Piece,
    #[serde(rename = "clove")]
    Clove,
    #[serde(rename = "slice")]
    Slice,
    #[serde(rename = "can")]
    Can,
    #[serde(rename = "jar")]
    Jar,
    #[serde(rename = "packet")]
    Packet,
    #[serde(rename = "bunch")]
    Bunch,
    #[serde(rename = "sprig")]
    Sprig,
    #[serde(rename = "stick")]
    Stick,
    #[serde(rename = "head")]
    Head,
    #[serde(rename = "stalk")]
    Stalk,
    #[serde(rename = "sheet")]
    Sheet,
    #[serde(rename = "fillet")]
    Fillet,
}

impl CanonicalUnit {
    /// Every unit, grouped volume, weight, count, item.
    pub const ALL: &'static [CanonicalUnit] = &[
        CanonicalUnit::Tsp,
        CanonicalUnit::Tbsp,
        CanonicalUnit::Cup,
        CanonicalUnit::Ml,
        CanonicalUnit::L,
        CanonicalUnit::FlOz,
        CanonicalUnit::Pint,
        CanonicalUnit::Quart,
        CanonicalUnit::Gallon,
        CanonicalUnit::G,
        CanonicalUnit::Kg,
        CanonicalUnit::Mg,
        CanonicalUnit::Oz,
        CanonicalUnit::Lb,
        CanonicalUnit::Pinch,
        CanonicalUnit::Dash,
        CanonicalUnit::Drop,
        CanonicalUnit::Handful,
        CanonicalUnit::Splash,
        CanonicalUnit::Piece,
        CanonicalUnit::Clove,
        CanonicalUnit::Slice,
        CanonicalUnit::Can,
        CanonicalUnit::Jar,
        CanonicalUnit::Packet,
        CanonicalUnit::Bunch,
        CanonicalUnit::Sprig,
        CanonicalUnit::Stick,
        CanonicalUnit::Head,
        CanonicalUnit::Stalk,
        CanonicalUnit::Sheet,
        CanonicalUnit::Fillet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalUnit::Tsp => "tsp",
            CanonicalUnit::Tbsp => "tbsp",
            CanonicalUnit::Cup => "cup",
            CanonicalUnit::Ml => "ml",
            CanonicalUnit::L => "l",
            CanonicalUnit::FlOz => "fl oz",
            CanonicalUnit::Pint => "pint",
            CanonicalUnit::Quart => "quart",
            CanonicalUnit::Gallon => "gallon",
            CanonicalUnit::G => "g",
            CanonicalUnit::Kg => "kg",
            CanonicalUnit::Mg => "mg",
            CanonicalUnit::Oz => "oz",
            CanonicalUnit::Lb => "lb",
            CanonicalUnit::Pinch => "pinch",
            CanonicalUnit::Dash => "dash",
            CanonicalUnit::Drop => "drop",
            CanonicalUnit::Handful => "handful",
            CanonicalUnit::Splash => "splash",
            CanonicalUnit::Piece => "piece",
            CanonicalUnit::Clove => "clove",
            CanonicalUnit::Slice => "slice",
            CanonicalUnit::Can => "can",
            CanonicalUnit::Jar => "jar",
            CanonicalUnit::Packet => "packet",
            CanonicalUnit::Bunch => "bunch",
            CanonicalUnit::Sprig => "sprig",
            CanonicalUnit::Stick => "stick",
            CanonicalUnit::Head => "head",
            CanonicalUnit::Stalk => "stalk",
            CanonicalUnit::Sheet => "sheet",
            CanonicalUnit::Fillet => "fillet",
        }
    }

    pub fn group(&self) -> UnitGroup {
        match self {
            CanonicalUnit::Tsp
            | CanonicalUnit::Tbsp
            | CanonicalUnit::Cup
            | CanonicalUnit::Ml
            | CanonicalUnit::L
            | CanonicalUnit::FlOz
            | CanonicalUnit::Pint
            | CanonicalUnit::Quart
            | CanonicalUnit::Gallon => UnitGroup::Volume,
            CanonicalUnit::G
            | CanonicalUnit::Kg
            | CanonicalUnit::Mg
            | CanonicalUnit::Oz
            | CanonicalUnit::Lb => UnitGroup::Weight,
            CanonicalUnit::Pinch
            | CanonicalUnit::Dash
            | CanonicalUnit::Drop
            | CanonicalUnit::Handful
            | CanonicalUnit::Splash => UnitGroup::Count,
            _ => UnitGroup::Item,
        }
    }

    /// Exact match against the canonical tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|u| u.as_str() == token)
    }

    /// Look up an alternate spelling. `normalized` must already have gone
    /// through [`normalize_token`].
    pub fn from_synonym(normalized: &str) -> Option<Self> {
        UNIT_SYNONYMS.get(normalized).copied()
    }
}

impl fmt::Display for CanonicalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical preparation applied to an ingredient, always a past participle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalPreparation {
    Diced,
    Chopped,
    Minced,
    Sliced,
    Grated,
    Shredded,
    Crushed,
    Mashed,
    Peeled,
    Julienned,
    Cubed,
    Halved,
    Quartered,
    Beaten,
    Whisked,
    Melted,
    Softened,
    Toasted,
    Roasted,
    Caramelized,
    Zested,
    Juiced,
    Drained,
    Rinsed,
    Trimmed,
    Cored,
    Seeded,
    Pitted,
    Sifted,
    Ground,
    Crumbled,
    Torn,
    Blanched,
    Pureed,
    Deveined,
    Thawed,
    Cooked,
    Chilled,
}

impl CanonicalPreparation {
    pub const ALL: &'static [CanonicalPreparation] = &[
        CanonicalPreparation::Diced,
        CanonicalPreparation::Chopped,
        CanonicalPreparation::Minced,
        CanonicalPreparation::Sliced,
        CanonicalPreparation::Grated,
        CanonicalPreparation::Shredded,
        CanonicalPreparation::Crushed,
        CanonicalPreparation::Mashed,
        CanonicalPreparation::Peeled,
        CanonicalPreparation::Julienned,
        CanonicalPreparation::Cubed,
        CanonicalPreparation::Halved,
        CanonicalPreparation::Quartered,
        CanonicalPreparation::Beaten,
        CanonicalPreparation::Whisked,
        CanonicalPreparation::Melted,
        CanonicalPreparation::Softened,
        CanonicalPreparation::Toasted,
        CanonicalPreparation::Roasted,
        CanonicalPreparation::Caramelized,
        CanonicalPreparation::Zested,
        CanonicalPreparation::Juiced,
        CanonicalPreparation::Drained,
        CanonicalPreparation::Rinsed,
        CanonicalPreparation::Trimmed,
        CanonicalPreparation::Cored,
        CanonicalPreparation::Seeded,
        CanonicalPreparation::Pitted,
        CanonicalPreparation::Sifted,
        CanonicalPreparation::Ground,
        CanonicalPreparation::Crumbled,
        CanonicalPreparation::Torn,
        CanonicalPreparation::Blanched,
        CanonicalPreparation::Pureed,
        CanonicalPreparation::Deveined,
        CanonicalPreparation::Thawed,
        CanonicalPreparation::Cooked,
        CanonicalPreparation::Chilled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalPreparation::Diced => "diced",
            CanonicalPreparation::Chopped => "chopped",
            CanonicalPreparation::Minced => "minced",
            CanonicalPreparation::Sliced => "sliced",
            CanonicalPreparation::Grated => "grated",
            CanonicalPreparation::Shredded => "shredded",
            CanonicalPreparation::Crushed => "crushed",
            CanonicalPreparation::Mashed => "mashed",
            CanonicalPreparation::Peeled => "peeled",
            CanonicalPreparation::Julienned => "julienned",
            CanonicalPreparation::Cubed => "cubed",
            CanonicalPreparation::Halved => "halved",
            CanonicalPreparation::Quartered => "quartered",
            CanonicalPreparation::Beaten => "beaten",
            CanonicalPreparation::Whisked => "whisked",
            CanonicalPreparation::Melted => "melted",
            CanonicalPreparation::Softened => "softened",
            CanonicalPreparation::Toasted => "toasted",
            CanonicalPreparation::Roasted => "roasted",
            CanonicalPreparation::Caramelized => "caramelized",
            CanonicalPreparation::Zested => "zested",
            CanonicalPreparation::Juiced => "juiced",
            CanonicalPreparation::Drained => "drained",
            CanonicalPreparation::Rinsed => "rinsed",
            CanonicalPreparation::Trimmed => "trimmed",
            CanonicalPreparation::Cored => "cored",
            CanonicalPreparation::Seeded => "seeded",
            CanonicalPreparation::Pitted => "pitted",
            CanonicalPreparation::Sifted => "sifted",
            CanonicalPreparation::Ground => "ground",
            CanonicalPreparation::Crumbled => "crumbled",
            CanonicalPreparation::Torn => "torn",
            CanonicalPreparation::Blanched => "blanched",
            CanonicalPreparation::Pureed => "pureed",
            CanonicalPreparation::Deveined => "deveined",
            CanonicalPreparation::Thawed => "thawed",
            CanonicalPreparation::Cooked => "cooked",
            CanonicalPreparation::Chilled => "chilled",
        }
    }

    /// Exact match against the canonical tokens.
    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.as_str() == token)
    }

    /// Look up an alternate spelling. `normalized` must already have gone
    /// through [`normalize_token`].
    pub fn from_synonym(normalized: &str) -> Option<Self> {
        PREPARATION_SYNONYMS.get(normalized).copied()
    }
}

impl fmt::Display for CanonicalPreparation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowercase, trim, collapse inner whitespace and drop one trailing period
/// ("Tbsp." -> "tbsp", "Fluid  Ounces" -> "fluid ounces").
pub fn normalize_token(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let lower = collapsed.to_lowercase();
    match lower.strip_suffix('.') {
        Some(stripped) => stripped.trim_end().to_string(),
        None => lower,
    }
}

static UNIT_SYNONYMS: LazyLock<HashMap<&'static str, CanonicalUnit>> =
    LazyLock::new(|| UNIT_SYNONYM_TABLE.iter().copied().collect());

static PREPARATION_SYNONYMS: LazyLock<HashMap<&'static str, CanonicalPreparation>> =
    LazyLock::new(|| PREPARATION_SYNONYM_TABLE.iter().copied().collect());

const UNIT_SYNONYM_TABLE: &[(&str, CanonicalUnit)] = &[
    // Volume
    ("teaspoon", CanonicalUnit::Tsp),
    ("teaspoons", CanonicalUnit::Tsp),
    ("tsps", CanonicalUnit::Tsp),
    ("ts", CanonicalUnit::Tsp),
    ("tablespoon", CanonicalUnit::Tbsp),
    ("tablespoons", CanonicalUnit::Tbsp),
    ("tbsps", CanonicalUnit::Tbsp),
    ("tbs", CanonicalUnit::Tbsp),
    ("tbl", CanonicalUnit::Tbsp),
    ("tb", CanonicalUnit::Tbsp),
    ("cups", CanonicalUnit::Cup),
    ("c", CanonicalUnit::Cup),
    ("milliliter", CanonicalUnit::Ml),
    ("milliliters", CanonicalUnit::Ml),
    ("millilitre", CanonicalUnit::Ml),
    ("millilitres", CanonicalUnit::Ml),
    ("mls", CanonicalUnit::Ml),
    ("liter", CanonicalUnit::L),
    ("liters", CanonicalUnit::L),
    ("litre", CanonicalUnit::L),
    ("litres", CanonicalUnit::L),
    ("ltr", CanonicalUnit::L),
    ("fluid ounce", CanonicalUnit::FlOz),
    ("fluid ounces", CanonicalUnit::FlOz),
    ("fl. oz", CanonicalUnit::FlOz),
    ("fl.oz", CanonicalUnit::FlOz),
    ("floz", CanonicalUnit::FlOz),
    ("pints", CanonicalUnit::Pint),
    ("pt", CanonicalUnit::Pint),
    ("pts", CanonicalUnit::Pint),
    ("quarts", CanonicalUnit::Quart),
    ("qt", CanonicalUnit::Quart),
    ("qts", CanonicalUnit::Quart),
    ("gallons", CanonicalUnit::Gallon),
    ("gal", CanonicalUnit::Gallon),
    ("gals", CanonicalUnit::Gallon),
    // Weight
    ("gram", CanonicalUnit::G),
    ("grams", CanonicalUnit::G),
    ("gramme", CanonicalUnit::G),
    ("grammes", CanonicalUnit::G),
    ("gr", CanonicalUnit::G),
    ("gms", CanonicalUnit::G),
    ("kilogram", CanonicalUnit::Kg),
    ("kilograms", CanonicalUnit::Kg),
    ("kilo", CanonicalUnit::Kg),
    ("kilos", CanonicalUnit::Kg),
    ("kgs", CanonicalUnit::Kg),
    ("milligram", CanonicalUnit::Mg),
    ("milligrams", CanonicalUnit::Mg),
    ("ounce", CanonicalUnit::Oz),
    ("ounces", CanonicalUnit::Oz),
    ("pound", CanonicalUnit::Lb),
    ("pounds", CanonicalUnit::Lb),
    ("lbs", CanonicalUnit::Lb),
    // Count
    ("pinches", CanonicalUnit::Pinch),
    ("dashes", CanonicalUnit::Dash),
    ("drops", CanonicalUnit::Drop),
    ("handfuls", CanonicalUnit::Handful),
    ("splashes", CanonicalUnit::Splash),
    // Item
    ("pieces", CanonicalUnit::Piece),
    ("pc", CanonicalUnit::Piece),
    ("pcs", CanonicalUnit::Piece),
    ("cloves", CanonicalUnit::Clove),
    ("slices", CanonicalUnit::Slice),
    ("cans", CanonicalUnit::Can),
    ("tin", CanonicalUnit::Can),
    ("tins", CanonicalUnit::Can),
    ("jars", CanonicalUnit::Jar),
    ("packets", CanonicalUnit::Packet),
    ("package", CanonicalUnit::Packet),
    ("packages", CanonicalUnit::Packet),
    ("pack", CanonicalUnit::Packet),
    ("packs", CanonicalUnit::Packet),
    ("pkg", CanonicalUnit::Packet),
    ("pkgs", CanonicalUnit::Packet),
    ("sachet", CanonicalUnit::Packet),
    ("sachets", CanonicalUnit::Packet),
    ("bunches", CanonicalUnit::Bunch),
    ("sprigs", CanonicalUnit::Sprig),
    ("sticks", CanonicalUnit::Stick),
    ("heads", CanonicalUnit::Head),
    ("stalks", CanonicalUnit::Stalk),
    ("sheets", CanonicalUnit::Sheet),
    ("fillets", CanonicalUnit::Fillet),
    ("filet", CanonicalUnit::Fillet),
    ("filets", CanonicalUnit::Fillet),
];

const PREPARATION_SYNONYM_TABLE: &[(&str, CanonicalPreparation)] = &[
    ("dice", CanonicalPreparation::Diced),
    ("finely diced", CanonicalPreparation::Diced),
    ("chop", CanonicalPreparation::Chopped),
    ("finely chopped", CanonicalPreparation::Chopped),
    ("roughly chopped", CanonicalPreparation::Chopped),
    ("coarsely chopped", CanonicalPreparation::Chopped),
    ("mince", CanonicalPreparation::Minced),
    ("finely minced", CanonicalPreparation::Minced),
    ("slice", CanonicalPreparation::Sliced),
    ("thinly sliced", CanonicalPreparation::Sliced),
    ("finely sliced", CanonicalPreparation::Sliced),
    ("grate", CanonicalPreparation::Grated),
    ("finely grated", CanonicalPreparation::Grated),
    ("freshly grated", CanonicalPreparation::Grated),
    ("shred", CanonicalPreparation::Shredded),
    ("crush", CanonicalPreparation::Crushed),
    ("mash", CanonicalPreparation::Mashed),
    ("peel", CanonicalPreparation::Peeled),
    ("julienne", CanonicalPreparation::Julienned),
    ("cube", CanonicalPreparation::Cubed),
    ("halve", CanonicalPreparation::Halved),
    ("halves", CanonicalPreparation::Halved),
    ("cut in half", CanonicalPreparation::Halved),
    ("quarter", CanonicalPreparation::Quartered),
    ("beat", CanonicalPreparation::Beaten),
    ("lightly beaten", CanonicalPreparation::Beaten),
    ("whisk", CanonicalPreparation::Whisked),
    ("melt", CanonicalPreparation::Melted),
    ("soften", CanonicalPreparation::Softened),
    ("toast", CanonicalPreparation::Toasted),
    ("roast", CanonicalPreparation::Roasted),
    ("caramelize", CanonicalPreparation::Caramelized),
    ("caramelise", CanonicalPreparation::Caramelized),
    ("caramelised", CanonicalPreparation::Caramelized),
    ("zest", CanonicalPreparation::Zested),
    ("juice", CanonicalPreparation::Juiced),
    ("drain", CanonicalPreparation::Drained),
    ("rinse", CanonicalPreparation::Rinsed),
    ("trim", CanonicalPreparation::Trimmed),
    ("core", CanonicalPreparation::Cored),
    ("seed", CanonicalPreparation::Seeded),
    ("deseed", CanonicalPreparation::Seeded),
    ("deseeded", CanonicalPreparation::Seeded),
    ("pit", CanonicalPreparation::Pitted),
    ("stoned", CanonicalPreparation::Pitted),
    ("sift", CanonicalPreparation::Sifted),
    ("grind", CanonicalPreparation::Ground),
    ("freshly ground", CanonicalPreparation::Ground),
    ("crumble", CanonicalPreparation::Crumbled),
    ("tear", CanonicalPreparation::Torn),
    ("roughly torn", CanonicalPreparation::Torn),
    ("blanch", CanonicalPreparation::Blanched),
    ("puree", CanonicalPreparation::Pureed),
    ("purée", CanonicalPreparation::Pureed),
    ("puréed", CanonicalPreparation::Pureed),
    ("devein", CanonicalPreparation::Deveined),
    ("thaw", CanonicalPreparation::Thawed),
    ("defrost", CanonicalPreparation::Thawed),
    ("defrosted", CanonicalPreparation::Thawed),
    ("cook", CanonicalPreparation::Cooked),
    ("chill", CanonicalPreparation::Chilled),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn canonical_tokens_round_trip() {
        for unit in CanonicalUnit::ALL {
            assert_eq!(CanonicalUnit::from_token(unit.as_str()), Some(*unit));
        }
        for prep in CanonicalPreparation::ALL {
            assert_eq!(CanonicalPreparation::from_token(prep.as_str()), Some(*prep));
        }
    }

    #[test]
    fn canonical_tokens_are_unique() {
        let units: HashSet<_> = CanonicalUnit::ALL.iter().map(|u| u.as_str()).collect();
        assert_eq!(units.len(), CanonicalUnit::ALL.len());
        let preps: HashSet<_> = CanonicalPreparation::ALL
            .iter()
            .map(|p| p.as_str())
            .collect();
        assert_eq!(preps.len(), CanonicalPreparation::ALL.len());
    }

    #[test]
    fn synonym_keys_are_normalized() {
        for (key, _) in UNIT_SYNONYM_TABLE {
            assert_eq!(normalize_token(key), *key, "unit synonym {key:?}");
        }
        for (key, _) in PREPARATION_SYNONYM_TABLE {
            assert_eq!(normalize_token(key), *key, "preparation synonym {key:?}");
        }
    }

    #[test]
    fn synonyms_never_shadow_canonical_tokens() {
        for (key, _) in UNIT_SYNONYM_TABLE {
            assert!(
                CanonicalUnit::from_token(key).is_none(),
                "{key:?} is already canonical"
            );
        }
        for (key, _) in PREPARATION_SYNONYM_TABLE {
            assert!(
                CanonicalPreparation::from_token(key).is_none(),
                "{key:?} is already canonical"
            );
        }
    }

    #[test]
    fn serde_uses_canonical_tokens() {
        assert_eq!(
            serde_json::to_string(&CanonicalUnit::FlOz).unwrap(),
            "\"fl oz\""
        );
        assert_eq!(
            serde_json::to_string(&CanonicalPreparation::Caramelized).unwrap(),
            "\"caramelized\""
        );
        for unit in CanonicalUnit::ALL {
            let json = serde_json::to_value(unit).unwrap();
            assert_eq!(json.as_str(), Some(unit.as_str()));
        }
    }

    #[test]
    fn unit_groups() {
        assert_eq!(CanonicalUnit::Cup.group(), UnitGroup::Volume);
        assert_eq!(CanonicalUnit::Lb.group(), UnitGroup::Weight);
        assert_eq!(CanonicalUnit::Pinch.group(), UnitGroup::Count);
        assert_eq!(CanonicalUnit::Clove.group(), UnitGroup::Item);
    }

    #[test]
    fn normalize_token_cleans_input() {
        assert_eq!(normalize_token("  Tbsp. "), "tbsp");
        assert_eq!(normalize_token("Fluid   Ounces"), "fluid ounces");
        assert_eq!(normalize_token(""), "");
    }
}
