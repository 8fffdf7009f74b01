use std::path::PathBuf;

use crate::app::controller::{InteractionController, UiCommand};
use crate::app::views::View;
use crate::config::Settings;
use crate::export::{self, ExportRequest, Projection};
use crate::scene::ORTHO_VIEWS;

const CURRENT: &str = "current";

/// Form for writing the scene to a PNG figure.
pub struct ExportView {
    projection: String,
    width: u32,
    height: u32,
    dpi: u32,
    path: String,
}

impl ExportView {
    pub fn new(settings: &Settings) -> Self {
        Self {
            projection: CURRENT.to_string(),
            width: settings.export.width,
            height: settings.export.height,
            dpi: settings.export.dpi,
            path: settings
                .export
                .output_dir
                .join("mapzebview.png")
                .display()
                .to_string(),
        }
    }

    fn request(&self) -> ExportRequest {
        let projection = if self.projection == CURRENT {
            Projection::Current
        } else {
            Projection::Named(self.projection.clone())
        };
        ExportRequest {
            projection,
            width: self.width,
            height: self.height,
            dpi: self.dpi,
            path: PathBuf::from(&self.path),
        }
    }
}

impl View for ExportView {
    fn draw(
        &mut self,
        ui: &mut egui::Ui,
        controller: &InteractionController,
        commands: &mut Vec<UiCommand>,
    ) {
        if !export::is_available() {
            ui.colored_label(
                ui.visuals().warn_fg_color,
                "Figure export is not available in this build.",
            );
        }

        egui::Grid::new("export_form").num_columns(2).show(ui, |ui| {
            ui.label("Projection");
            egui::ComboBox::from_id_salt("export_projection")
                .selected_text(self.projection.as_str())
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.projection, CURRENT.to_string(), CURRENT);
                    for (name, _, _) in ORTHO_VIEWS {
                        ui.selectable_value(&mut self.projection, name.to_string(), *name);
                    }
                });
            ui.end_row();

            ui.label("Size");
            ui.horizontal(|ui| {
                ui.add(egui::DragValue::new(&mut self.width).range(100..=4000));
                ui.label("x");
                ui.add(egui::DragValue::new(&mut self.height).range(100..=4000));
            });
            ui.end_row();

            ui.label("DPI");
            ui.add(egui::DragValue::new(&mut self.dpi).range(50..=1200));
            ui.end_row();

            ui.label("File");
            ui.text_edit_singleline(&mut self.path);
            ui.end_row();
        });

        let ready = controller.state().marker.is_some();
        if ui
            .add_enabled(ready, egui::Button::new("Export"))
            .clicked()
        {
            commands.push(UiCommand::Export(self.request()));
        }
    }
}
