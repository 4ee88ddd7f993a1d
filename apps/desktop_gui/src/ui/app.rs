use std::time::{Duration, Instant};

use client_core::{ComposerState, ValidationPrompt, WikiResultsView, WIKI_LANGUAGES};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{EduType, Style, Volume};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::{
    abort_generation, abort_search, clear_composer, submit_generation, submit_search,
};
use crate::controller::reducer::{reduce, ShellStatus};
use crate::ui::clipboard::SystemClipboard;

const BUSY_REPAINT: Duration = Duration::from_millis(100);
const IDLE_REPAINT: Duration = Duration::from_millis(500);

pub struct ComposerApp {
    state: ComposerState,
    shell: ShellStatus,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    prompt: Option<String>,
    clipboard: SystemClipboard,
}

impl ComposerApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            state: ComposerState::new(),
            shell: ShellStatus::default(),
            cmd_tx,
            ui_rx,
            prompt: None,
            clipboard: SystemClipboard::default(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            reduce(&mut self.state, &mut self.shell, event);
        }
    }

    fn show_prompt_for(&mut self, prompt: ValidationPrompt) {
        self.prompt = Some(prompt.to_string());
    }

    fn show_mode_menu(&mut self, ui: &mut egui::Ui) {
        ui.horizontal_wrapped(|ui| {
            for button in self.state.mode_buttons() {
                if ui.selectable_label(button.active, button.label).clicked() {
                    self.state.select_mode(button.mode);
                }
            }
        });
    }

    fn show_header(&self, ui: &mut egui::Ui) {
        let header = self.state.header();
        ui.heading(header.title);
        ui.label(egui::RichText::new(header.subtitle).weak());
        ui.add_space(8.0);
    }

    fn show_form(&mut self, ui: &mut egui::Ui) {
        let header = self.state.header();
        ui.label(header.input_label);
        ui.add(
            egui::TextEdit::multiline(&mut self.state.topic)
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );

        ui.horizontal(|ui| {
            ui.label("Объём:");
            egui::ComboBox::from_id_salt("volume")
                .selected_text(self.state.volume.label())
                .show_ui(ui, |ui| {
                    for volume in Volume::ALL {
                        ui.selectable_value(&mut self.state.volume, volume, volume.label());
                    }
                });
            ui.label("Стиль:");
            egui::ComboBox::from_id_salt("style")
                .selected_text(self.state.style.label())
                .show_ui(ui, |ui| {
                    for style in Style::ALL {
                        ui.selectable_value(&mut self.state.style, style, style.label());
                    }
                });
        });

        if header.show_author {
            ui.add_space(6.0);
            egui::CollapsingHeader::new("👤 Данные автора")
                .default_open(true)
                .show(ui, |ui| self.show_author_panel(ui));
        }
    }

    fn show_author_panel(&mut self, ui: &mut egui::Ui) {
        let author = &mut self.state.author;
        egui::Grid::new("author_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label("ФИО:");
                ui.text_edit_singleline(&mut author.name);
                ui.end_row();

                ui.label("Кто вы:");
                egui::ComboBox::from_id_salt("edu_type")
                    .selected_text(author.edu_type.label())
                    .show_ui(ui, |ui| {
                        for edu_type in EduType::ALL {
                            ui.selectable_value(&mut author.edu_type, edu_type, edu_type.label());
                        }
                    });
                ui.end_row();

                ui.label(match author.edu_type {
                    EduType::Student => "Курс:",
                    EduType::Pupil => "Класс:",
                });
                ui.text_edit_singleline(&mut author.grade);
                ui.end_row();

                ui.label("Учебное заведение:");
                ui.text_edit_singleline(&mut author.institution);
                ui.end_row();

                ui.label("Группа:");
                ui.text_edit_singleline(&mut author.group);
                ui.end_row();

                ui.label("Преподаватель:");
                ui.text_edit_singleline(&mut author.teacher);
                ui.end_row();
            });
        ui.checkbox(&mut author.include_title, "Добавить титульный лист");
    }

    fn show_wiki_panel(&mut self, ui: &mut egui::Ui) {
        ui.add_space(6.0);
        let mut enabled = self.state.use_wikipedia();
        if ui
            .checkbox(&mut enabled, "📚 Использовать Википедию")
            .changed()
        {
            self.state.set_use_wikipedia(enabled);
        }
        if !self.state.use_wikipedia() {
            return;
        }

        ui.group(|ui| {
            ui.horizontal(|ui| {
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.state.wiki_query)
                        .hint_text("Поиск статей (по умолчанию тема)"),
                );
                let submitted =
                    response.lost_focus() && ui.input(|input| input.key_pressed(egui::Key::Enter));

                egui::ComboBox::from_id_salt("wiki_lang")
                    .selected_text(self.state.wiki_lang.clone())
                    .show_ui(ui, |ui| {
                        for (code, label) in WIKI_LANGUAGES {
                            ui.selectable_value(&mut self.state.wiki_lang, code.to_string(), label);
                        }
                    });

                let search_enabled = !self.state.search_in_flight();
                let clicked = ui
                    .add_enabled(search_enabled, egui::Button::new("🔍 Найти"))
                    .clicked();
                if clicked || (submitted && search_enabled) {
                    if let Err(prompt) =
                        submit_search(&mut self.state, &mut self.shell, &self.cmd_tx)
                    {
                        self.show_prompt_for(prompt);
                    }
                }
                if self.state.search_in_flight() && ui.button("⏹").clicked() {
                    abort_search(&mut self.state, &mut self.shell, &self.cmd_tx);
                }
                ui.label(self.state.wiki_status().text());
            });

            if self.state.selection_banner_visible() {
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "📌 Выбрано статей: {}",
                        self.state.selection_badge()
                    ));
                    if ui.small_button("Сбросить").clicked() {
                        self.state.clear_selection();
                    }
                });
            }

            match self.state.wiki_results() {
                WikiResultsView::Empty => {}
                WikiResultsView::Loading(text) => {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(text);
                    });
                }
                WikiResultsView::NoResults(text) => {
                    ui.label(egui::RichText::new(text).weak());
                }
                WikiResultsView::Error(message) => {
                    ui.colored_label(ui.visuals().error_fg_color, message);
                }
                WikiResultsView::Cards(cards) => {
                    let mut toggled = Vec::new();
                    for card in cards {
                        ui.add_enabled_ui(card.enabled, |ui| {
                            let mut checked = card.checked;
                            if ui.checkbox(&mut checked, card.title.as_str()).changed() {
                                toggled.push(card.title.clone());
                            }
                            let details = match card.wordcount {
                                Some(words) => format!("{} · {words} слов", card.description),
                                None => card.description.clone(),
                            };
                            ui.label(egui::RichText::new(details).small().weak());
                        });
                        ui.add_space(4.0);
                    }
                    for title in toggled {
                        self.state.toggle_selection(&title);
                    }
                }
            }
        });
    }

    fn show_actions(&mut self, ui: &mut egui::Ui, now: Instant) {
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let generate = ui.add_enabled(
                self.state.generate_enabled(),
                egui::Button::new(self.state.generate_button_label()),
            );
            if generate.clicked() {
                if let Err(prompt) =
                    submit_generation(&mut self.state, &mut self.shell, &self.cmd_tx, now)
                {
                    self.show_prompt_for(prompt);
                }
            }
            if self.state.is_generating() && ui.button("⏹ Отменить").clicked() {
                abort_generation(&mut self.state, &mut self.shell, &self.cmd_tx);
            }
            if ui.button("🗑 Очистить").clicked() {
                clear_composer(&mut self.state, &mut self.shell, &self.cmd_tx);
            }
            if ui.button(self.state.copy_button_label(now)).clicked() {
                self.copy_result(now);
            }
            if ui.button("💾 Скачать").clicked() {
                self.download_result();
            }
        });

        if self.state.loading_visible() {
            ui.horizontal(|ui| {
                ui.spinner();
                if let Some(caption) = self.state.loading_caption(now) {
                    ui.label(caption);
                }
            });
        }
    }

    fn copy_result(&mut self, now: Instant) {
        match self.state.copy_to(&mut self.clipboard, now) {
            Ok(()) => {}
            Err(err) => match err.prompt() {
                Some(prompt) => self.show_prompt_for(prompt),
                None => self.shell.message = Some(err.to_string()),
            },
        }
    }

    fn download_result(&mut self) {
        let millis = u128::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        let file = match self.state.download(millis) {
            Ok(file) => file,
            Err(prompt) => {
                self.show_prompt_for(prompt);
                return;
            }
        };

        let mut dialog = rfd::FileDialog::new()
            .set_file_name(&file.filename)
            .add_filter("Текст", &["txt"]);
        if let Some(dir) = dirs::download_dir().or_else(dirs::home_dir) {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.save_file() else {
            return;
        };
        self.shell.message = Some(match file.write_to(&path) {
            Ok(()) => format!("Сохранено: {}", path.display()),
            Err(err) => err.to_string(),
        });
    }

    fn show_result(&mut self, ui: &mut egui::Ui) {
        if !self.state.result_visible() {
            return;
        }
        ui.separator();
        let mut text = self.state.result_text();
        ui.add(
            egui::TextEdit::multiline(&mut text)
                .desired_rows(16)
                .desired_width(f32::INFINITY),
        );
        if !self.state.stats_text().is_empty() {
            ui.label(self.state.stats_text());
        }
    }

    fn show_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let backend = if self.shell.backend_ready {
                "🟢 сервер подключён"
            } else {
                "⚪ запуск..."
            };
            ui.label(egui::RichText::new(backend).small());
            let mut dismissed = false;
            if let Some(message) = &self.shell.message {
                ui.separator();
                ui.label(egui::RichText::new(message.as_str()).small());
                dismissed = ui.small_button("✖").clicked();
            }
            if dismissed {
                self.shell.message = None;
            }
        });
    }

    fn show_prompt(&mut self, ctx: &egui::Context) {
        let Some(message) = self.prompt.clone() else {
            return;
        };
        egui::Window::new("Внимание")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                if ui.button("OK").clicked() {
                    self.prompt = None;
                }
            });
    }
}

impl eframe::App for ComposerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        let now = Instant::now();

        egui::TopBottomPanel::top("mode_menu").show(ctx, |ui| self.show_mode_menu(ui));
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| self.show_status_bar(ui));
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.show_header(ui);
                self.show_form(ui);
                self.show_wiki_panel(ui);
                self.show_actions(ui, now);
                self.show_result(ui);
            });
        });
        self.show_prompt(ctx);

        if self.state.is_generating() || self.state.search_in_flight() {
            ctx.request_repaint_after(BUSY_REPAINT);
        } else {
            ctx.request_repaint_after(IDLE_REPAINT);
        }
    }
}
