use datamapper_core::{DomainObject, LazyHandlers, LazyState, PropertyMap, Schema, Value};
use std::cell::Cell;
use std::sync::OnceLock;

thread_local! {
    static NOTE_SAVES: Cell<usize> = const { Cell::new(0) };
}

/// Number of times the `notes` saver ran on this test thread
#[allow(dead_code)]
pub fn note_saves() -> usize {
    NOTE_SAVES.with(Cell::get)
}

/// Contact record used across the core integration tests
///
/// `notes` is lazy: its loader hands back whatever the record already holds,
/// and its saver only counts invocations.
#[derive(Debug, Clone, Default)]
pub struct Contact {
    pub id: Option<i64>,
    pub name: String,
    pub email: Option<String>,
    pub score: Option<f64>,
    pub notes: Option<String>,
    pub lazy: LazyState,
}

impl DomainObject for Contact {
    fn schema() -> &'static Schema<Self> {
        static SCHEMA: OnceLock<Schema<Contact>> = OnceLock::new();
        SCHEMA.get_or_init(|| {
            Schema::<Contact>::builder("Contact")
                .identity(
                    "id",
                    |c| c.id.into(),
                    |c, v| {
                        c.id = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "name",
                    |c| c.name.as_str().into(),
                    |c, v| {
                        c.name = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "email",
                    |c| c.email.clone().into(),
                    |c, v| {
                        c.email = v.extract()?;
                        Ok(())
                    },
                )
                .property(
                    "score",
                    |c| c.score.into(),
                    |c, v| {
                        c.score = v.extract()?;
                        Ok(())
                    },
                )
                .lazy(
                    "notes",
                    LazyHandlers::<Contact>::new()
                        .load(|c| Ok(c.notes.clone().into()))
                        .store(|c, v| {
                            c.notes = v.extract()?;
                            Ok(())
                        })
                        .persist(|_| {
                            NOTE_SAVES.with(|n| n.set(n.get() + 1));
                            Ok(())
                        }),
                )
                .track_loaded(|c| &c.lazy, |c| &mut c.lazy)
                .build()
        })
    }
}

/// Build a property map from literal pairs
#[allow(dead_code)]
pub fn props(pairs: &[(&str, Value)]) -> PropertyMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
