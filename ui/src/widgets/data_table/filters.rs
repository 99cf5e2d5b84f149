//! Filter picker window and the chips of active filters.

use chrono::{DateTime, Utc};
use egui::{Color32, ComboBox, Frame, Margin, RichText, TextEdit, Ui, Window};
use egui_extras::DatePickerButton;
use fundesk_business::filters::{FilterDefinition, FilterEvent, PickerView, Relation, find_definition};
use fundesk_business::server::ServerTable;
use ustr::Ustr;

const CHIP_FILL: Color32 = Color32::from_rgb(238, 242, 255);

/// Active filters as removable chips.
pub fn render_filter_chips<R: Send + 'static>(ui: &mut Ui, server: &mut ServerTable<R>) {
    let chips = server.filters().chips(server.definitions());
    if chips.is_empty() {
        return;
    }

    let mut remove: Option<(Ustr, Ustr)> = None;
    ui.horizontal_wrapped(|ui| {
        for chip in &chips {
            Frame::NONE
                .fill(CHIP_FILL)
                .corner_radius(8.0)
                .inner_margin(Margin::symmetric(6, 2))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        if let Some(icon) = &chip.icon {
                            ui.label(icon);
                        }
                        ui.label(RichText::new(&chip.name).strong());
                        ui.label(&chip.label);
                        if ui.small_button("✕").on_hover_text("Remove filter").clicked() {
                            remove = Some((chip.filter_id, chip.option_id));
                        }
                    });
                });
        }
    });

    if let Some((filter_id, option_id)) = remove {
        server.remove_filter(&filter_id, &option_id);
    }
}

/// What the picker window asked for this frame.
#[derive(Default)]
struct PickerOutput {
    choose: Option<Ustr>,
    event: Option<FilterEvent>,
    relation: Option<(Ustr, Relation)>,
    back: bool,
}

/// The command-palette window, shown while the picker is open.
pub fn render_filter_picker<R: Send + 'static>(
    ui: &mut Ui,
    id: &str,
    server: &mut ServerTable<R>,
    now: DateTime<Utc>,
) {
    if !server.picker().is_open() {
        return;
    }

    let mut open = true;
    let mut output = PickerOutput::default();
    Window::new("Add filter")
        .id(egui::Id::new(id).with("filter_picker"))
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(280.0)
        .show(ui.ctx(), |ui| {
            let view = server.picker().view().clone();
            match view {
                PickerView::Closed => {}
                PickerView::Root => render_root(ui, server, &mut output),
                PickerView::Options { filter_id } => {
                    output.back = ui.small_button("← Back").clicked();
                    render_options(ui, server, filter_id, &mut output);
                }
                PickerView::DateRange { filter_id, start, end } => {
                    output.back = ui.small_button("← Back").clicked();
                    render_relation(ui, server, filter_id, &mut output);
                    let today = now.date_naive();
                    let mut start_date = start.unwrap_or(today);
                    let mut end_date = end.or(start).unwrap_or(today);
                    ui.horizontal(|ui| {
                        ui.label("From");
                        if ui.add(DatePickerButton::new(&mut start_date).id_salt("range_start")).changed() {
                            server.picker_mut().set_range_start(start_date);
                        }
                        ui.label("to");
                        if ui.add(DatePickerButton::new(&mut end_date).id_salt("range_end")).changed() {
                            server.picker_mut().set_range_end(end_date);
                        }
                    });
                    let ready = start.is_some() && end.is_some();
                    if ui.add_enabled(ready, egui::Button::new("Apply")).clicked() {
                        output.event = server.picker_mut().confirm_date_range();
                    }
                }
                PickerView::UserSearch { .. } => {
                    output.back = ui.small_button("← Back").clicked();
                    render_user_search(ui, server, now, &mut output);
                }
            }
        });

    if !open {
        server.picker_mut().close();
        return;
    }
    if output.back {
        server.picker_mut().back();
    }
    if let Some(filter_id) = output.choose {
        server.choose_filter(&filter_id);
    }
    if let Some((filter_id, relation)) = output.relation {
        server.set_relation(&filter_id, relation);
    }
    if let Some(event) = output.event {
        server.apply_filter_event(event);
    }
}

fn render_root<R: Send + 'static>(ui: &mut Ui, server: &mut ServerTable<R>, output: &mut PickerOutput) {
    let mut query = server.picker().query().to_owned();
    if ui
        .add(TextEdit::singleline(&mut query).hint_text("Filter by..."))
        .changed()
    {
        server.picker_mut().set_query(query);
    }
    ui.separator();

    let visible = server.picker().visible_definitions(server.definitions());
    if visible.is_empty() {
        ui.weak("No filters found.");
    }
    for definition in visible {
        match definition {
            FilterDefinition::Divider => {
                ui.separator();
            }
            FilterDefinition::Component { field, .. }
            | FilterDefinition::DateRange { field }
            | FilterDefinition::UserSelect { field } => {
                let label = match &field.icon {
                    Some(icon) => format!("{icon} {}", field.name),
                    None => field.name.clone(),
                };
                if ui.selectable_label(false, label).clicked() {
                    output.choose = Some(field.id);
                }
            }
        }
    }
}

fn render_options<R: Send + 'static>(
    ui: &mut Ui,
    server: &mut ServerTable<R>,
    filter_id: Ustr,
    output: &mut PickerOutput,
) {
    let Some(definition) = find_definition(server.definitions(), &filter_id) else {
        ui.weak("This filter is no longer available.");
        return;
    };

    render_relation(ui, server, filter_id, output);

    let mut query = server.picker().query().to_owned();
    if ui
        .add(TextEdit::singleline(&mut query).hint_text(definition.name()))
        .changed()
    {
        server.picker_mut().set_query(query);
    }
    ui.separator();

    let options = server.picker().visible_options(server.definitions());
    if options.is_empty() {
        ui.weak("No options found.");
    }
    let mut picked = None;
    for option in options {
        let active = server.filters().contains(&filter_id, &option.id);
        let label = match &option.icon {
            Some(icon) => format!("{icon} {}", option.label),
            None => option.label.clone(),
        };
        if ui.selectable_label(active, label).clicked() {
            picked = Some(option.id);
        }
    }
    if let Some(option_id) = picked {
        output.event = server.picker_mut().pick_option(&option_id);
    }
}

/// Operator selector, shown when the definition offers a choice.
fn render_relation<R: Send + 'static>(
    ui: &mut Ui,
    server: &ServerTable<R>,
    filter_id: Ustr,
    output: &mut PickerOutput,
) {
    let Some(definition) = find_definition(server.definitions(), &filter_id) else {
        return;
    };
    let relations = definition.relations();
    if relations.len() < 2 {
        return;
    }

    let current = server.filters().relation(&filter_id, server.definitions());
    let mut relation = current;
    ComboBox::from_id_salt(ui.id().with(filter_id.as_str()))
        .selected_text(relation.label())
        .show_ui(ui, |ui| {
            for &option in relations {
                ui.selectable_value(&mut relation, option, option.label());
            }
        });
    if relation != current {
        output.relation = Some((filter_id, relation));
    }
}

fn render_user_search<R: Send + 'static>(
    ui: &mut Ui,
    server: &mut ServerTable<R>,
    now: DateTime<Utc>,
    output: &mut PickerOutput,
) {
    let mut query = server.picker().user_query().to_owned();
    if ui
        .add(TextEdit::singleline(&mut query).hint_text("Search people..."))
        .changed()
    {
        server.picker_mut().set_user_query(query, now);
    }
    ui.separator();

    let picker = server.picker();
    if picker.is_searching_users() {
        ui.spinner();
    }
    if let Some(err) = picker.user_error() {
        ui.colored_label(Color32::RED, err.display_message());
    } else if picker.users().is_empty() && !picker.is_searching_users() {
        ui.weak("No people found.");
    }

    let mut picked = None;
    for user in picker.users() {
        let response = ui.selectable_label(false, user.display_name());
        let response = match &user.email {
            Some(email) => response.on_hover_text(email),
            None => response,
        };
        if response.clicked() {
            picked = Some(user.id.clone());
        }
    }
    if let Some(user_id) = picked {
        output.event = server.picker_mut().pick_user(&user_id);
    }
}
