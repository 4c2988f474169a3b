use super::{generator, Chooser, GenerationConfig, GeneratorTable, Nullability};
use crate::config::GenerationSettings;
use crate::domain::cursor::Cursor;
use crate::domain::kind::Kind;
use crate::domain::value::{callback, element};
use crate::inference::TypeLeaf;
use fake::faker::internet::en::DomainSuffix;
use fake::faker::lorem::en::{Sentence, Word};
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

const ELEMENT_TAGS: [&str; 6] = ["div", "span", "p", "section", "button", "strong"];

/// The single source of randomness behind one policy.
pub struct Entropy {
    rng: Mutex<StdRng>,
}

impl Entropy {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Run `f` with exclusive access to the generator.
    pub fn with<R>(&self, f: impl FnOnce(&mut StdRng) -> R) -> R {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

/// Plausible random values: lorem text, colors and URLs chosen by field
/// name, bounded list lengths, and a chance of `null` for optional fields.
#[derive(Clone)]
pub struct RandomPolicy {
    entropy: Arc<Entropy>,
    null_probability: f64,
    null_probability_by_kind: HashMap<Kind, f64>,
    min_items: usize,
    max_items: usize,
    number_min: i64,
    number_max: i64,
}

impl RandomPolicy {
    pub fn new() -> Self {
        Self::with_entropy(Entropy::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_entropy(Entropy::seeded(seed))
    }

    fn with_entropy(entropy: Entropy) -> Self {
        Self {
            entropy: Arc::new(entropy),
            null_probability: 0.25,
            null_probability_by_kind: HashMap::new(),
            min_items: 1,
            max_items: 4,
            number_min: 0,
            number_max: 100,
        }
    }

    pub fn from_settings(settings: &GenerationSettings) -> Self {
        let policy = match settings.seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        };

        // Config keys arrive lowercased; settings validation rejects names
        // that are not built-in kinds.
        let policy = settings
            .null_probability_by_kind
            .iter()
            .filter_map(|(name, p)| Kind::builtin(name).map(|kind| (kind, *p)))
            .fold(policy, |policy, (kind, p)| policy.with_kind_null_probability(kind, p));

        policy
            .with_null_probability(settings.null_probability)
            .with_items(settings.min_items, settings.max_items)
            .with_number_range(settings.number_min, settings.number_max)
    }

    pub fn with_null_probability(mut self, p: f64) -> Self {
        self.null_probability = probability(p);
        self
    }

    pub fn with_kind_null_probability(mut self, kind: Kind, p: f64) -> Self {
        self.null_probability_by_kind.insert(kind, probability(p));
        self
    }

    pub fn with_items(mut self, min: usize, max: usize) -> Self {
        self.min_items = min.min(max);
        self.max_items = min.max(max);
        self
    }

    pub fn with_number_range(mut self, min: i64, max: i64) -> Self {
        self.number_min = min.min(max);
        self.number_max = min.max(max);
        self
    }

    /// Generation config drawing from this policy's entropy.
    pub fn config(&self) -> GenerationConfig {
        GenerationConfig::new()
            .merge(self.generators())
            .with_chooser(Arc::new(RandomChooser {
                entropy: Arc::clone(&self.entropy),
            }))
            .with_nullability(Arc::new(RandomNullability {
                entropy: Arc::clone(&self.entropy),
                default: self.null_probability,
                by_kind: self.null_probability_by_kind.clone(),
            }))
    }

    fn generators(&self) -> GeneratorTable {
        let mut table = GeneratorTable::new();
        let (min_items, max_items) = (self.min_items, self.max_items);

        let entropy = Arc::clone(&self.entropy);
        table.insert(
            Kind::String,
            generator(move |path, _, _, _| json!(entropy.with(|rng| text_for(path, rng)))),
        );

        let entropy = Arc::clone(&self.entropy);
        let (number_min, number_max) = (self.number_min, self.number_max);
        table.insert(
            Kind::Number,
            generator(move |_, _, _, _| json!(entropy.with(|rng| rng.gen_range(number_min..=number_max)))),
        );

        let entropy = Arc::clone(&self.entropy);
        table.insert(
            Kind::Bool,
            generator(move |_, _, _, _| json!(entropy.with(|rng| rng.gen_bool(0.5)))),
        );

        let entropy = Arc::clone(&self.entropy);
        table.insert(
            Kind::Array,
            generator(move |_, _, _, _| {
                entropy.with(|rng| {
                    let len = rng.gen_range(min_items..=max_items);
                    let words = (0..len).map(|_| json!(Word().fake_with_rng::<String, _>(rng)));
                    Value::Array(words.collect())
                })
            }),
        );

        let entropy = Arc::clone(&self.entropy);
        table.insert(
            Kind::Object,
            generator(move |_, _, _, _| {
                entropy.with(|rng| {
                    let len = rng.gen_range(min_items..=max_items);
                    let mut map = Map::new();
                    for _ in 0..len {
                        let key: String = Word().fake_with_rng(rng);
                        let value: String = Word().fake_with_rng(rng);
                        map.insert(key, json!(value));
                    }
                    Value::Object(map)
                })
            }),
        );

        table.insert(
            Kind::Func,
            generator(|path, _, _, _| callback(path.last_key().unwrap_or("callback"))),
        );

        let entropy = Arc::clone(&self.entropy);
        table.insert(
            Kind::Any,
            generator(move |_, _, _, _| json!(entropy.with(|rng| Word().fake_with_rng::<String, _>(rng)))),
        );

        let entropy = Arc::clone(&self.entropy);
        table.insert(
            Kind::Node,
            generator(move |_, _, _, _| {
                json!(entropy.with(|rng| Sentence(1..4).fake_with_rng::<String, _>(rng)))
            }),
        );

        let entropy = Arc::clone(&self.entropy);
        table.insert(
            Kind::Element,
            generator(move |_, _, _, _| {
                let tag = entropy.with(|rng| ELEMENT_TAGS[rng.gen_range(0..ELEMENT_TAGS.len())]);
                element(tag, json!({}))
            }),
        );

        // The length is drawn before recursing: item generation takes the
        // entropy lock itself.
        let entropy = Arc::clone(&self.entropy);
        table.insert(
            Kind::ArrayOf,
            generator(move |path, recurse, leaf, _| {
                let Some(item) = leaf.element_type() else {
                    return Value::Array(Vec::new());
                };
                let len = entropy.with(|rng| rng.gen_range(min_items..=max_items));
                Value::Array((0..len).map(|i| recurse(item, &path.child(i))).collect())
            }),
        );

        table
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}

struct RandomChooser {
    entropy: Arc<Entropy>,
}

impl Chooser for RandomChooser {
    fn choose(&self, _path: &Cursor, len: usize) -> Option<usize> {
        (len > 0).then(|| self.entropy.with(|rng| rng.gen_range(0..len)))
    }
}

struct RandomNullability {
    entropy: Arc<Entropy>,
    default: f64,
    by_kind: HashMap<Kind, f64>,
}

impl Nullability for RandomNullability {
    fn should_null(&self, _path: &Cursor, leaf: &TypeLeaf) -> bool {
        if leaf.required {
            return false;
        }
        let p = self.by_kind.get(&leaf.kind).copied().unwrap_or(self.default);
        self.entropy.with(|rng| rng.gen_bool(p))
    }
}

fn text_for(path: &Cursor, rng: &mut StdRng) -> String {
    let field = path.last_key().unwrap_or_default().to_ascii_lowercase();

    if field.contains("color") {
        format!("#{:06x}", rng.gen_range(0..=0xff_ffffu32))
    } else if field.contains("url") || field.contains("href") {
        let host: String = Word().fake_with_rng(rng);
        let suffix: String = DomainSuffix().fake_with_rng(rng);
        let page: String = Word().fake_with_rng(rng);
        format!("https://{host}.{suffix}/{page}")
    } else {
        Sentence(1..4).fake_with_rng(rng)
    }
}

fn probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::{is_callback, is_element};
    use crate::generation::{generate_value_for_type, value_satisfies_type};
    use crate::inference::infer_type;
    use crate::prop_types::ValidatorLibrary;

    fn library() -> ValidatorLibrary {
        let lib = ValidatorLibrary::new();
        lib.instrument();
        lib
    }

    #[test]
    fn test_seeded_policies_are_reproducible() {
        let lib = library();
        let v = lib.shape([
            ("title", lib.string()),
            ("count", lib.number().is_required()),
            ("tags", lib.array_of(lib.string().is_required())),
        ]);
        let t = infer_type(&lib, &v.is_required());

        let a = generate_value_for_type(&t, &Cursor::root(), &RandomPolicy::seeded(7).config());
        let b = generate_value_for_type(&t, &Cursor::root(), &RandomPolicy::seeded(7).config());
        assert_eq!(a, b);
    }

    #[test]
    fn test_field_names_shape_strings() {
        let lib = library();
        let config = RandomPolicy::seeded(1).config();
        let t = infer_type(&lib, &lib.string().is_required());

        let color = generate_value_for_type(&t, &Cursor::root().child("backgroundColor"), &config);
        let color = color.as_str().unwrap();
        assert_eq!(color.len(), 7);
        assert!(color.starts_with('#'));

        let url = generate_value_for_type(&t, &Cursor::root().child("imageUrl"), &config);
        assert!(url.as_str().unwrap().starts_with("https://"));
    }

    #[test]
    fn test_list_lengths_within_bounds() {
        let lib = library();
        let config = RandomPolicy::seeded(3).with_items(2, 3).config();
        let t = infer_type(&lib, &lib.array_of(lib.number().is_required()).is_required());

        for _ in 0..20 {
            let value = generate_value_for_type(&t, &Cursor::root(), &config);
            let len = value.as_array().unwrap().len();
            assert!((2..=3).contains(&len));
        }
    }

    #[test]
    fn test_null_probability_applies_to_optional_only() {
        let lib = library();
        let always = RandomPolicy::seeded(5).with_null_probability(1.0).config();
        let optional = infer_type(&lib, &lib.number());
        let required = infer_type(&lib, &lib.number().is_required());

        assert!(generate_value_for_type(&optional, &Cursor::root(), &always).is_null());
        assert!(!generate_value_for_type(&required, &Cursor::root(), &always).is_null());

        let never = RandomPolicy::seeded(5)
            .with_null_probability(1.0)
            .with_kind_null_probability(Kind::Number, 0.0)
            .config();
        assert!(!generate_value_for_type(&optional, &Cursor::root(), &never).is_null());
    }

    #[test]
    fn test_markers_and_ranges() {
        let lib = library();
        let config = RandomPolicy::seeded(11).with_number_range(5, 5).config();

        let func = infer_type(&lib, &lib.func().is_required());
        let value = generate_value_for_type(&func, &Cursor::root().child("onClick"), &config);
        assert!(is_callback(&value));

        let el = infer_type(&lib, &lib.element().is_required());
        assert!(is_element(&generate_value_for_type(&el, &Cursor::root(), &config)));

        let n = infer_type(&lib, &lib.number().is_required());
        assert_eq!(generate_value_for_type(&n, &Cursor::root(), &config), json!(5));
    }

    #[test]
    fn test_random_values_satisfy_their_types() {
        let lib = library();
        let config = RandomPolicy::seeded(42).config();
        let v = lib
            .shape([
                ("size", lib.one_of(vec![json!("sm"), json!("lg")]).is_required()),
                ("value", lib.one_of_type(vec![lib.number(), lib.bool()])),
                ("children", lib.node()),
                ("meta", lib.object_of(lib.string())),
                ("extra", lib.object()),
                ("list", lib.array()),
            ])
            .is_required();
        let t = infer_type(&lib, &v);

        for _ in 0..25 {
            let value = generate_value_for_type(&t, &Cursor::root(), &config);
            assert!(value_satisfies_type(&value, &t), "{value}");
        }
    }

    #[test]
    fn test_from_settings_maps_lowercased_kind_names() {
        let settings = GenerationSettings {
            null_probability_by_kind: HashMap::from([
                ("oneof".to_string(), 1.0),
                ("string".to_string(), 0.0),
            ]),
            ..GenerationSettings::default()
        };
        let policy = RandomPolicy::from_settings(&settings);

        assert_eq!(policy.null_probability_by_kind.len(), 2);
        assert_eq!(policy.null_probability_by_kind.get(&Kind::OneOf), Some(&1.0));
        assert_eq!(policy.null_probability_by_kind.get(&Kind::String), Some(&0.0));
    }

    #[test]
    fn test_probability_is_sanitized() {
        assert_eq!(probability(f64::NAN), 0.0);
        assert_eq!(probability(2.0), 1.0);
        assert_eq!(probability(-1.0), 0.0);
    }
}
