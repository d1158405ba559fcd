//! Main module for the cooldown note page using Yew.
//! Wires persisted form state, the debounced template editor and the solver
//! submission together.

use cooldown_notes::persistence::Persistence;
use cooldown_notes::submission::{HttpTransport, Outcome, SubmissionController};
use cooldown_notes::{empty_cooldown, CooldownEntry};
use log::debug;
use yew::prelude::*;

mod components;
mod config;
mod hooks;
mod utils;

use components::{NoteOutput, RaidSetup, TemplateEditor};
use config::*;
use hooks::use_persisted_state;
use utils::alert;

/// Page component: cooldown table on top, template and output below.
#[function_component(Main)]
fn main_component() -> Html {
    let cooldowns = use_persisted_state(STORAGE_COOLDOWNS, || vec![empty_cooldown()]);
    let template = use_persisted_state(STORAGE_TEMPLATE, String::new);
    let output = use_state(String::new);
    let is_loading = use_state(|| false);
    let controller = use_memo((), |_| SubmissionController::new(HttpTransport::default()));

    // Every committed change starts a new submission; the previous one is
    // cancelled by the controller and its reply discarded.
    {
        let controller = controller.clone();
        let output = output.clone();
        let is_loading = is_loading.clone();
        use_effect_with(
            ((*template).clone(), (*cooldowns).clone()),
            move |(template, cooldowns)| {
                let template = template.clone();
                let cooldowns = cooldowns.clone();
                let task_controller = controller.clone();
                is_loading.set(true);

                wasm_bindgen_futures::spawn_local(async move {
                    let Some(outcome) = task_controller.submit(&template, &cooldowns).await else {
                        return;
                    };
                    match outcome {
                        Outcome::Output(text) => output.set(text),
                        Outcome::Alert(message) => alert(&message),
                    }
                    is_loading.set(false);
                });

                move || controller.cancel()
            },
        );
    }

    let on_cooldowns_change = {
        let cooldowns = cooldowns.clone();
        Callback::from(move |updated: Vec<CooldownEntry>| cooldowns.set(updated))
    };

    let on_template_input = {
        let is_loading = is_loading.clone();
        Callback::from(move |_: ()| is_loading.set(true))
    };

    let on_template_commit = {
        let template = template.clone();
        let is_loading = is_loading.clone();
        let controller = controller.clone();
        Callback::from(move |text: String| {
            // An unchanged commit starts no request, so nothing else would
            // clear the indicator raised while typing.
            if text == *template && controller.is_idle() {
                debug!("Template commit unchanged, clearing loading indicator");
                is_loading.set(false);
            }
            template.set(text);
        })
    };

    html! {
        <div class="flex flex-col space-y-1 h-full">
            <RaidSetup
                cooldowns={(*cooldowns).clone()}
                on_change={on_cooldowns_change}
            />
            <div class="flex flex-row space-x-1 flex-auto p-1">
                <TemplateEditor
                    template={(*template).clone()}
                    on_commit={on_template_commit}
                    on_input={on_template_input}
                />
                <NoteOutput
                    value={(*output).clone()}
                    is_loading={*is_loading}
                />
            </div>
        </div>
    }
}

/// App wrapper providing the persistence service to the page.
#[function_component]
pub fn App() -> Html {
    let persistence = use_memo((), |_| Persistence::browser());

    html! {
        <ContextProvider<Persistence> context={(*persistence).clone()}>
            <Main />
        </ContextProvider<Persistence>>
    }
}

/// Entry point: initializes Yew renderer for the App component.
fn main() {
    console_error_panic_hook::set_once();
    yew::Renderer::<App>::new().render();
}
