use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::app::controller::{InteractionController, NoticeLevel, UiCommand};
use crate::app::options::RunOptions;
use crate::app::views::View;
use crate::app::views::control_panel::ControlPanel;
use crate::app::views::export_view::ExportView;
use crate::app::views::section_view::SectionView;
use crate::app::views::volume_view::VolumeView;
use crate::atlas::{AtlasSource, HttpAtlasSource, SyntheticAtlasSource};
use crate::config::Settings;
use crate::error::AppError;
use crate::scene::SectionAxis;

const TITLE: &str = "mapzebview";

pub struct AtlasApp {
    controller: InteractionController,
    control_panel: ControlPanel,
    sections: [SectionView; 3],
    volume_view: VolumeView,
    export_view: ExportView,
    show_export: bool,
}

impl AtlasApp {
    pub fn new(controller: InteractionController) -> Self {
        let export_view = ExportView::new(controller.settings());
        Self {
            controller,
            control_panel: ControlPanel::new(),
            sections: SectionAxis::ALL.map(SectionView::new),
            volume_view: VolumeView::new(),
            export_view,
            show_export: false,
        }
    }

    pub fn start_gui(controller: InteractionController) -> Result<(), AppError> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size(egui::vec2(1400.0, 900.0))
                .with_title(TITLE)
                .with_drag_and_drop(true),
            ..Default::default()
        };

        eframe::run_native(
            TITLE,
            options,
            Box::new(move |_cc| Ok(Box::new(AtlasApp::new(controller)))),
        )
        .map_err(|e| AppError::Ui(e.to_string()))
    }

    fn dropped_files(ctx: &egui::Context) -> Vec<PathBuf> {
        ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|file| file.path.clone())
                .collect()
        })
    }
}

impl eframe::App for AtlasApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let changes = self.controller.poll();
        if !changes.is_empty() {
            debug!("Applied {} change(s) from background fetches", changes.len());
        }

        let mut commands: Vec<UiCommand> = Self::dropped_files(ctx)
            .into_iter()
            .map(UiCommand::ImportFile)
            .collect();

        let Self {
            controller,
            control_panel,
            sections,
            volume_view,
            export_view,
            show_export,
        } = self;

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading(TITLE);
                ui.separator();
                if ui.button("Export figure").clicked() {
                    *show_export = !*show_export;
                }
                if controller.is_loading() {
                    ui.spinner();
                    ui.label("Loading atlas data");
                }
            });
        });

        egui::TopBottomPanel::bottom("notice_panel")
            .resizable(true)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("Notices");
                    if ui.small_button("Clear").clicked() {
                        commands.push(UiCommand::DismissNotices);
                    }
                });
                egui::ScrollArea::vertical().show(ui, |ui| {
                    for notice in controller.notices().iter().rev() {
                        let color = match notice.level {
                            NoticeLevel::Info => ui.visuals().text_color(),
                            NoticeLevel::Error => ui.visuals().error_fg_color,
                        };
                        ui.colored_label(color, notice.to_string());
                    }
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    control_panel.draw(ui, controller, &mut commands);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let cell = egui::vec2(ui.available_width() / 2.0, ui.available_height() / 2.0);
            let [sagittal, coronal, transverse] = sections;
            ui.horizontal(|ui| {
                ui.allocate_ui(cell, |ui| sagittal.draw(ui, controller, &mut commands));
                ui.allocate_ui(cell, |ui| coronal.draw(ui, controller, &mut commands));
            });
            ui.horizontal(|ui| {
                ui.allocate_ui(cell, |ui| transverse.draw(ui, controller, &mut commands));
                ui.allocate_ui(cell, |ui| volume_view.draw(ui, controller, &mut commands));
            });
        });

        egui::Window::new("Export figure")
            .open(show_export)
            .resizable(false)
            .show(ctx, |ui| export_view.draw(ui, controller, &mut commands));

        for command in commands {
            self.controller.handle(command);
        }

        if self.controller.is_loading() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_millis(200));
        }
    }
}

/// The atlas backend selected by the settings.
pub fn atlas_source(settings: &Settings) -> Result<Arc<dyn AtlasSource>, AppError> {
    if settings.debug {
        info!("Debug mode: using the synthetic atlas");
        return Ok(Arc::new(SyntheticAtlasSource::default()));
    }
    Ok(Arc::new(HttpAtlasSource::new(settings)?))
}

/// Opens the viewer and blocks until its window is closed.
pub fn run(settings: Settings, options: RunOptions) -> Result<(), AppError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mapzebview-fetch")
        .build()?;
    let _guard = runtime.enter();

    let source = atlas_source(&settings)?;
    let mut controller = InteractionController::new(settings, source, runtime.handle().clone());
    controller.apply_options(options);
    info!("Starting viewer");
    AtlasApp::start_gui(controller)
}
