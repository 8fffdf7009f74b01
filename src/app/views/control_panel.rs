use std::collections::HashSet;
use std::path::PathBuf;

use crate::app::controller::{InteractionController, UiCommand};
use crate::app::views::View;
use crate::scene::Rgb;

/// Marker selector, region tree and ROI set list.
#[derive(Default)]
pub struct ControlPanel {
    region_query: String,
    import_path: String,
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    fn draw_marker(
        &self,
        ui: &mut egui::Ui,
        controller: &InteractionController,
        commands: &mut Vec<UiCommand>,
    ) {
        ui.heading("Marker line");
        let current = controller.state().marker.as_deref();
        egui::ComboBox::from_id_salt("marker_select")
            .selected_text(current.unwrap_or("None"))
            .show_ui(ui, |ui| {
                for name in controller.marker_names() {
                    if ui
                        .selectable_label(current == Some(name.as_str()), name)
                        .clicked()
                    {
                        commands.push(UiCommand::SelectMarker(name.clone()));
                    }
                }
            });
        if let Some(pending) = controller.pending_marker() {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(format!("Loading {pending}"));
            });
        }
    }

    fn draw_regions(
        &mut self,
        ui: &mut egui::Ui,
        controller: &InteractionController,
        commands: &mut Vec<UiCommand>,
    ) {
        let state = controller.state();
        ui.heading("Regions");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.region_query).hint_text("Search regions"));
            if ui.button("Clear").clicked() {
                for name in state.region_names() {
                    commands.push(UiCommand::ToggleRegion(name.to_string()));
                }
            }
        });

        let selected: HashSet<String> = state.region_names().map(str::to_string).collect();
        let catalog = controller.catalog();
        let visible = catalog.search(&self.region_query, &selected);

        egui::ScrollArea::vertical()
            .id_salt("region_tree")
            .max_height(320.0)
            .show(ui, |ui| {
                for entry in catalog.entries().iter().filter(|e| visible.contains(&e.id)) {
                    ui.horizontal(|ui| {
                        ui.add_space(entry.depth as f32 * 12.0);
                        let pending = controller.is_region_pending(entry.name);
                        let mut checked = state.has_region(entry.name) || pending;
                        if ui.checkbox(&mut checked, entry.name).changed() {
                            commands.push(UiCommand::ToggleRegion(entry.name.to_string()));
                        }
                        if pending {
                            ui.spinner();
                        }
                        if let Some(color) = state.regions.get(entry.name) {
                            let mut rgb = color.0;
                            if ui.color_edit_button_srgb(&mut rgb).changed() {
                                commands.push(UiCommand::SetRegionColor(
                                    entry.name.to_string(),
                                    Rgb(rgb),
                                ));
                            }
                        }
                    });
                }
            });
    }

    fn draw_rois(
        &mut self,
        ui: &mut egui::Ui,
        controller: &InteractionController,
        commands: &mut Vec<UiCommand>,
    ) {
        ui.heading("ROI sets");
        ui.horizontal(|ui| {
            ui.add(egui::TextEdit::singleline(&mut self.import_path).hint_text("path/to/rois.npy"));
            if ui.button("Import").clicked() && !self.import_path.trim().is_empty() {
                commands.push(UiCommand::ImportFile(PathBuf::from(self.import_path.trim())));
            }
        });
        ui.label("Or drop .npy / .h5 files onto the window.");

        for (name, layer) in &controller.state().roi_sets {
            ui.horizontal(|ui| {
                let mut visible = layer.visible;
                if ui.checkbox(&mut visible, "").changed() {
                    commands.push(UiCommand::SetRoiVisible(name.clone(), visible));
                }
                let mut rgb = layer.color.0;
                if ui.color_edit_button_srgb(&mut rgb).changed() {
                    commands.push(UiCommand::SetRoiColor(name.clone(), Rgb(rgb)));
                }
                ui.label(format!("{name} ({} points)", layer.points.len()));
                if ui.small_button("Remove").clicked() {
                    commands.push(UiCommand::RemoveRoiSet(name.clone()));
                }
            });
        }
    }
}

impl View for ControlPanel {
    fn draw(
        &mut self,
        ui: &mut egui::Ui,
        controller: &InteractionController,
        commands: &mut Vec<UiCommand>,
    ) {
        self.draw_marker(ui, controller, commands);
        ui.separator();
        self.draw_regions(ui, controller, commands);
        ui.separator();
        self.draw_rois(ui, controller, commands);
    }
}
