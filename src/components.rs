//! Yew view components for the cooldown note page.
//!
//! Everything here renders from props and reports edits upward through
//! callbacks; the only local state is the template draft.

use crate::config::*;
use crate::hooks::use_debounced_draft;
use crate::utils::{input_value, textarea_value};
use cooldown_notes::{add_cooldown, remove_at, update_at, CooldownEntry, CooldownSeconds};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ButtonLinkProps {
    pub onclick: Callback<()>,
    #[prop_or_default]
    pub class: Classes,
    pub children: Html,
}

/// Text link that behaves like a button.
#[function_component(ButtonLink)]
pub fn button_link(props: &ButtonLinkProps) -> Html {
    let onclick = {
        let onclick = props.onclick.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            onclick.emit(());
        })
    };

    html! {
        <a href="#"
            class={classes!("text-s", "text-blue-600", "hover:text-blue-900", props.class.clone())}
            {onclick}
        >
            { props.children.clone() }
        </a>
    }
}

/// One editable cooldown row.
#[derive(Properties, PartialEq)]
pub struct CooldownRowProps {
    pub entry: CooldownEntry,
    pub on_change: Callback<CooldownEntry>,
    pub on_remove: Callback<()>,
}

#[function_component(CooldownRow)]
pub fn cooldown_row(props: &CooldownRowProps) -> Html {
    // Each field re-issues the whole record with the other two untouched.
    let edit = |apply: fn(&mut CooldownEntry, String)| {
        let entry = props.entry.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            let mut updated = entry.clone();
            apply(&mut updated, input_value(&e));
            on_change.emit(updated);
        })
    };

    let on_name = edit(|entry, text| entry.display_name = text);
    let on_cooldown = edit(|entry, text| entry.cooldown = CooldownSeconds::Text(text));
    let on_groups = edit(|entry, text| entry.group_name = text);

    html! {
        <tr>
            <td>
                <input type="text"
                    class="form-input rounded"
                    placeholder={NAME_PLACEHOLDER}
                    value={props.entry.display_name.clone()}
                    oninput={on_name}
                />
            </td>
            <td>
                <input type="number"
                    class="form-input rounded"
                    placeholder={COOLDOWN_PLACEHOLDER}
                    value={props.entry.cooldown.to_string()}
                    oninput={on_cooldown}
                />
            </td>
            <td>
                <input type="text"
                    class="form-input rounded"
                    placeholder={GROUPS_PLACEHOLDER}
                    size={GROUPS_INPUT_SIZE.to_string()}
                    value={props.entry.group_name.clone()}
                    oninput={on_groups}
                />
            </td>
            <td>
                <ButtonLink onclick={props.on_remove.clone()}>{ "[Remove]" }</ButtonLink>
            </td>
        </tr>
    }
}

/// The cooldown table with its Add / Remove controls.
#[derive(Properties, PartialEq)]
pub struct RaidSetupProps {
    pub cooldowns: Vec<CooldownEntry>,
    pub on_change: Callback<Vec<CooldownEntry>>,
}

#[function_component(RaidSetup)]
pub fn raid_setup(props: &RaidSetupProps) -> Html {
    let on_add = {
        let cooldowns = props.cooldowns.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |_: ()| on_change.emit(add_cooldown(&cooldowns)))
    };

    let rows = props.cooldowns.iter().enumerate().map(|(index, entry)| {
        let on_update = {
            let cooldowns = props.cooldowns.clone();
            let on_change = props.on_change.clone();
            Callback::from(move |updated: CooldownEntry| {
                on_change.emit(update_at(&cooldowns, index, updated))
            })
        };
        let on_remove = {
            let cooldowns = props.cooldowns.clone();
            let on_change = props.on_change.clone();
            Callback::from(move |_: ()| on_change.emit(remove_at(&cooldowns, index)))
        };

        html! {
            <CooldownRow key={index}
                entry={entry.clone()}
                on_change={on_update}
                {on_remove}
            />
        }
    });

    html! {
        <div class="flex-none bg-gray-100 p-1">
            <span class="font-bold">{ "Available Cooldowns:" }</span>
            <ButtonLink class="pl-2" onclick={on_add}>{ "[Add]" }</ButtonLink>
            <table class="table-fixed">
                <tbody>
                    { for rows }
                </tbody>
            </table>
        </div>
    }
}

/// Template textarea that commits upward after a quiet period.
#[derive(Properties, PartialEq)]
pub struct TemplateEditorProps {
    pub template: String,
    /// Fired once typing has paused for the debounce delay.
    pub on_commit: Callback<String>,
    /// Fired on every keystroke.
    pub on_input: Callback<()>,
}

#[function_component(TemplateEditor)]
pub fn template_editor(props: &TemplateEditorProps) -> Html {
    let draft = use_debounced_draft(
        props.template.clone(),
        TEMPLATE_DEBOUNCE_MS,
        props.on_commit.clone(),
    );

    let oninput = {
        let push = draft.on_input.clone();
        let on_input = props.on_input.clone();
        Callback::from(move |e: InputEvent| {
            push.emit(textarea_value(&e));
            on_input.emit(());
        })
    };

    html! {
        <textarea
            class="flex-auto rounded resize-none"
            value={draft.draft}
            {oninput}
        />
    }
}

#[function_component(Spinner)]
pub fn spinner() -> Html {
    html! {
        <svg aria-hidden="true"
            class="w-8 h-8 mr-2 text-gray-200 animate-spin dark:text-gray-600 fill-blue-600"
            viewBox="0 0 100 101"
            fill="none"
            xmlns="http://www.w3.org/2000/svg"
        >
            <path
                d="M100 50.5908C100 78.2051 77.6142 100.591 50 100.591C22.3858 100.591 0 78.2051 0 50.5908C0 22.9766 22.3858 0.59082 50 0.59082C77.6142 0.59082 100 22.9766 100 50.5908ZM9.08144 50.5908C9.08144 73.1895 27.4013 91.5094 50 91.5094C72.5987 91.5094 90.9186 73.1895 90.9186 50.5908C90.9186 27.9921 72.5987 9.67226 50 9.67226C27.4013 9.67226 9.08144 27.9921 9.08144 50.5908Z"
                fill="currentColor"
            />
            <path
                d="M93.9676 39.0409C96.393 38.4038 97.8624 35.9116 97.0079 33.5539C95.2932 28.8227 92.871 24.3692 89.8167 20.348C85.8452 15.1192 80.8826 10.7238 75.2124 7.41289C69.5422 4.10194 63.2754 1.94025 56.7698 1.05124C51.7666 0.367541 46.6976 0.446843 41.7345 1.27873C39.2613 1.69328 37.813 4.19778 38.4501 6.62326C39.0873 9.04874 41.5694 10.4717 44.0505 10.1071C47.8511 9.54855 51.7191 9.52689 55.5402 10.0491C60.8642 10.7766 65.9928 12.5457 70.6331 15.2552C75.2735 17.9648 79.3347 21.5619 82.5849 25.841C84.9175 28.9121 86.7997 32.2913 88.1811 35.8758C89.083 38.2158 91.5421 39.6781 93.9676 39.0409Z"
                fill="currentFill"
            />
        </svg>
    }
}

/// Read-only solver output with a spinner overlay while a request is pending.
#[derive(Properties, PartialEq)]
pub struct NoteOutputProps {
    pub value: String,
    pub is_loading: bool,
}

#[function_component(NoteOutput)]
pub fn note_output(props: &NoteOutputProps) -> Html {
    html! {
        <div class="flex-auto relative">
            if props.is_loading {
                <span class="absolute m-auto inset-1/2"><Spinner /></span>
            }
            <textarea
                class="h-full w-full rounded resize-none bg-gray-100"
                value={props.value.clone()}
                readonly=true
            />
        </div>
    }
}
