use cooldown_notes::debounce::{BrowserClock, Debouncer};
use cooldown_notes::persistence::{Falsy, Persistence};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use yew::prelude::*;

/// State that is loaded from and written back to the injected [`Persistence`].
///
/// The initial value is read once on mount. Every change afterwards is saved;
/// an empty value deletes the key.
#[hook]
pub fn use_persisted_state<T, F>(key: &'static str, fallback: F) -> UseStateHandle<T>
where
    T: Clone + PartialEq + Serialize + DeserializeOwned + Falsy + 'static,
    F: FnOnce() -> T,
{
    let persistence = use_context::<Persistence>().unwrap_or_else(|| {
        warn!("No persistence provided for {:?}, state will not survive reloads", key);
        Persistence::in_memory()
    });

    let state = {
        let persistence = persistence.clone();
        use_state(move || persistence.load(key, fallback()))
    };

    {
        let value = (*state).clone();
        use_effect_with(value, move |value| {
            if let Err(e) = persistence.save(key, value) {
                warn!("Failed to persist {:?}: {}", key, e);
            }
            || ()
        });
    }

    state
}

/// Holds the state and callbacks for a debounced text field.
pub struct DebouncedDraft {
    /// What the field shows right now, committed or not.
    pub draft: String,
    /// Feed a keystroke: echoes it and re-arms the commit countdown.
    pub on_input: Callback<String>,
}

/// Echo every edit immediately, but only hand it to `on_commit` once the user
/// has stopped typing for `delay_ms`.
///
/// The pending commit is dropped when the component unmounts.
#[hook]
pub fn use_debounced_draft(
    committed: String,
    delay_ms: u32,
    on_commit: Callback<String>,
) -> DebouncedDraft {
    let draft = use_state(move || committed);

    // The timer outlives the render that armed it, so it calls whatever
    // callback the latest render handed us.
    let latest_commit = use_mut_ref(|| on_commit.clone());
    *latest_commit.borrow_mut() = on_commit;

    let debouncer = {
        let latest_commit = latest_commit.clone();
        use_mut_ref(move || {
            Debouncer::new(delay_ms, BrowserClock, move |text: String| {
                let commit = latest_commit.borrow().clone();
                commit.emit(text);
            })
        })
    };

    let on_input = {
        let draft = draft.clone();
        Callback::from(move |text: String| {
            draft.set(text.clone());
            debouncer.borrow_mut().push(text);
        })
    };

    DebouncedDraft {
        draft: (*draft).clone(),
        on_input,
    }
}
