use super::{ChargeProcessor, NotificationKind, ResultsTable};
use crate::upload::PLACEHOLDER_ROW;
use crate::utils::color::Palette;
use crate::utils::file_size::format_size;
use eframe::egui::{self, Color32, RichText, Stroke};

const RESULT_COLUMNS: [&str; 4] = ["Row #", "Practice", "Patient ID", "Result"];

impl ChargeProcessor {
    pub fn render(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.add_space(20.0);
                ui.vertical_centered(|ui| {
                    ui.heading("Charge Processor");
                    ui.add_space(5.0);
                    ui.label(
                        RichText::new("Upload a charge file to create encounters and post payments")
                            .color(ui.visuals().text_color().gamma_multiply(0.7)),
                    );
                });

                ui.add_space(20.0);
                self.render_credentials(ui);
                ui.add_space(15.0);
                self.render_drop_zone(ui);
                ui.add_space(15.0);

                ui.vertical_centered(|ui| {
                    let button = egui::Button::new(self.state.phase.button_label())
                        .min_size(egui::vec2(200.0, 40.0));
                    if ui.add_enabled(self.state.phase.accepts_submit(), button).clicked() {
                        self.start_processing();
                    }
                });

                if self.state.progress.visible {
                    ui.add_space(15.0);
                    let fill = if self.state.progress.failed {
                        Palette::danger()
                    } else {
                        Palette::primary_glow()
                    };
                    ui.add(
                        egui::ProgressBar::new(self.state.progress.fraction())
                            .show_percentage()
                            .animate(false)
                            .fill(fill),
                    );
                }

                ui.add_space(15.0);
                self.render_notifications(ui);

                if self.state.results.is_some() {
                    ui.add_space(10.0);
                    self.render_results(ui);
                }
                ui.add_space(20.0);
            });
        });
    }

    fn render_credentials(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.state.is_busy();
        ui.group(|ui| {
            ui.add_enabled_ui(enabled, |ui| {
                egui::Grid::new("credentials")
                    .num_columns(2)
                    .spacing([12.0, 8.0])
                    .show(ui, |ui| {
                        let credentials = &mut self.credentials;

                        ui.label("Customer Key");
                        ui.add(
                            egui::TextEdit::singleline(&mut credentials.customer_key)
                                .desired_width(280.0),
                        );
                        ui.end_row();

                        ui.label("Username");
                        ui.add(
                            egui::TextEdit::singleline(&mut credentials.username)
                                .desired_width(280.0),
                        );
                        ui.end_row();

                        ui.label("Password");
                        ui.add(
                            egui::TextEdit::singleline(&mut credentials.password)
                                .password(true)
                                .desired_width(280.0),
                        );
                        ui.end_row();
                    });
            });
        });
    }

    fn render_drop_zone(&mut self, ui: &mut egui::Ui) {
        let border = if self.state.drag_hover {
            Palette::primary_glow()
        } else {
            Palette::border()
        };

        let zone = egui::Frame::none()
            .stroke(Stroke::new(2.0, border))
            .rounding(8.0)
            .inner_margin(24.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.vertical_centered(|ui| match &self.selected_file {
                    Some(file) => {
                        let label = match file.size() {
                            Some(size) => format!("📄 {} ({})", file.name, format_size(size)),
                            None => format!("📄 {}", file.name),
                        };
                        ui.label(RichText::new(label).strong());
                    }
                    None => {
                        ui.label("📁 Click to browse or drag a file here");
                    }
                });
            });

        let response = zone.response.interact(egui::Sense::click());
        if response.clicked() && self.state.phase.accepts_selection() {
            self.browse_for_file();
        }
    }

    fn render_notifications(&mut self, ui: &mut egui::Ui) {
        let mut dismissed = None;

        for (index, notification) in self.state.notifications.iter().enumerate() {
            let color = match notification.kind {
                NotificationKind::Success => Palette::success(),
                NotificationKind::Danger => Palette::danger(),
            };
            egui::Frame::none()
                .stroke(Stroke::new(1.0, color))
                .fill(color.gamma_multiply(0.15))
                .rounding(6.0)
                .inner_margin(10.0)
                .show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.horizontal_wrapped(|ui| {
                        ui.colored_label(color, &notification.message);
                        if ui.small_button("✕").clicked() {
                            dismissed = Some(index);
                        }
                    });
                });
            ui.add_space(4.0);
        }

        if let Some(index) = dismissed {
            self.dismiss_notification(index);
        }
    }

    fn render_results(&mut self, ui: &mut egui::Ui) {
        ui.group(|ui| {
            ui.horizontal(|ui| {
                ui.heading("Results");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let label = match &self.state.download {
                        Some(link) => format!("⬇ Download {}", link.file_name),
                        None => "⬇ Download".to_string(),
                    };
                    let armed = self.state.download.is_some();
                    if ui.add_enabled(armed, egui::Button::new(label)).clicked() {
                        self.open_download();
                    }
                });
            });
            ui.separator();

            egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                egui::Grid::new("results")
                    .striped(true)
                    .num_columns(RESULT_COLUMNS.len())
                    .spacing([16.0, 6.0])
                    .show(ui, |ui| {
                        for column in RESULT_COLUMNS {
                            ui.label(RichText::new(column).strong());
                        }
                        ui.end_row();

                        if let Some(ResultsTable::Rows(rows)) = &self.state.results {
                            for row in rows {
                                ui.label(&row.row_number);
                                ui.label(&row.practice_name);
                                ui.label(&row.patient_id);
                                ui.label(&row.outcome);
                                ui.end_row();
                            }
                        }
                    });

                // Outside the grid so it spans the table instead of one column.
                if matches!(self.state.results, Some(ResultsTable::Placeholder)) {
                    ui.add_space(6.0);
                    ui.vertical_centered(|ui| {
                        ui.label(
                            RichText::new(PLACEHOLDER_ROW).color(Color32::from_rgb(150, 150, 150)),
                        );
                    });
                }
            });
        });
    }
}
