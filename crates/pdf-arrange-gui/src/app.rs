use eframe::egui;
use egui::{Align2, Color32, CursorIcon, FontId, Key, Sense, Stroke, StrokeKind, TextureHandle};
use pdf_arrange::geometry;
use pdf_arrange::{
    ArrangeError, CancellationToken, DocumentId, EditorOptions, EntryId, Progress, RasterImage,
    SlotController, SlotId, SlotLayout, StatusKind, StatusMessage,
};
use pdf_async_runtime::{PdfCommand, PdfUpdate};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::logger::ActivityLog;

/// Height of a thumbnail as drawn, whatever it was rendered at
const THUMB_HEIGHT: f32 = 160.0;
const LABEL_HEIGHT: f32 = 18.0;

const COPY_COLOR: Color32 = Color32::from_rgb(66, 133, 244);
const DISPLACED_COLOR: Color32 = Color32::from_rgb(245, 158, 11);
const SUCCESS_COLOR: Color32 = Color32::from_rgb(60, 160, 60);

const FULL_UV: egui::Rect = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

/// A cancellable background job and its latest progress
struct TaskState {
    cancel: CancellationToken,
    progress: Option<Progress>,
}

impl TaskState {
    fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            progress: None,
        }
    }
}

#[derive(Default)]
struct SlotView {
    loading: Option<TaskState>,
    assembling: Option<TaskState>,
}

/// Something the user asked for while the frame was being drawn
enum Action {
    Open(SlotId),
    Assemble(SlotId),
    CancelLoad(SlotId),
    CancelAssembly(SlotId),
    DragStart(EntryId),
    Delete(EntryId),
}

pub struct PdfArrangeApp {
    controller: SlotController,
    options: EditorOptions,
    views: [SlotView; 2],
    textures: HashMap<(DocumentId, u32), TextureHandle>,

    // Async infrastructure
    command_tx: mpsc::UnboundedSender<PdfCommand>,
    update_rx: mpsc::UnboundedReceiver<PdfUpdate>,

    activity: ActivityLog,

    // Runtime handle
    _tokio_handle: tokio::runtime::Handle,
}

impl PdfArrangeApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        tokio_handle: tokio::runtime::Handle,
        activity: ActivityLog,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        // Spawn worker task
        let renderer = crate::renderer::default_renderer();
        tokio_handle.spawn(crate::worker::worker_task(command_rx, update_tx, renderer));

        let options = EditorOptions::default();
        Self {
            controller: SlotController::new(&options),
            options,
            views: Default::default(),
            textures: HashMap::new(),
            command_tx,
            update_rx,
            activity,
            _tokio_handle: tokio_handle,
        }
    }

    fn view(&mut self, slot: SlotId) -> &mut SlotView {
        &mut self.views[slot.index()]
    }

    fn send(&mut self, command: PdfCommand) {
        if self.command_tx.send(command).is_err() {
            log::error!("Worker is gone; command dropped");
            self.controller
                .set_status(StatusMessage::error("Background worker stopped"));
        }
    }

    fn busy(&self) -> bool {
        self.views
            .iter()
            .any(|v| v.loading.is_some() || v.assembling.is_some())
    }

    // =========================================================================
    // Commands
    // =========================================================================

    fn start_load(&mut self, slot: SlotId, path: PathBuf) {
        // One load per slot; cancel the running one first
        if self.view(slot).loading.is_some() {
            self.controller.set_status(StatusMessage::info(format!(
                "Still loading a PDF ({slot}); cancel it first"
            )));
            return;
        }

        let cancel = CancellationToken::new();
        self.view(slot).loading = Some(TaskState::new(cancel.clone()));
        self.controller
            .set_status(StatusMessage::info(format!("Loading PDF ({slot})...")));

        let scale = self.options.render.thumbnail_scale;
        self.send(PdfCommand::LoadSlot {
            slot,
            path,
            scale,
            cancel,
        });
    }

    fn start_assembly(&mut self, slot: SlotId) {
        if self.view(slot).assembling.is_some() {
            return;
        }

        let Ok(job) = self.controller.assembly_job(slot) else {
            return;
        };

        let cancel = CancellationToken::new();
        self.view(slot).assembling = Some(TaskState::new(cancel.clone()));
        let options = self.options.assembly.clone();
        self.send(PdfCommand::AssembleSlot {
            job,
            options,
            cancel,
        });
    }

    /// Escape / Ctrl+C: stop everything in flight
    fn cancel_all(&mut self) {
        for view in &self.views {
            for task in [&view.loading, &view.assembling].into_iter().flatten() {
                task.cancel.cancel();
            }
        }
        self.controller.drag_end();
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Open(slot) => {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("PDF", &["pdf"])
                    .pick_file()
                {
                    self.start_load(slot, path);
                }
            }
            Action::Assemble(slot) => self.start_assembly(slot),
            Action::CancelLoad(slot) => {
                if let Some(task) = &self.view(slot).loading {
                    task.cancel.cancel();
                }
            }
            Action::CancelAssembly(slot) => {
                if let Some(task) = &self.view(slot).assembling {
                    task.cancel.cancel();
                }
            }
            Action::DragStart(entry) => {
                if let Err(e) = self.controller.drag_start(entry) {
                    log::warn!("Could not start drag: {}", e);
                }
            }
            Action::Delete(entry) => {
                // Status already explains the refusal
                let _ = self.controller.delete(entry);
            }
        }
    }

    // =========================================================================
    // Worker updates
    // =========================================================================

    fn process_updates(&mut self, ctx: &egui::Context) {
        while let Ok(update) = self.update_rx.try_recv() {
            match update {
                PdfUpdate::LoadProgress { slot, progress } => {
                    if let Some(task) = &mut self.view(slot).loading {
                        task.progress = Some(progress);
                    }
                }
                PdfUpdate::SlotLoaded {
                    slot,
                    name,
                    bytes,
                    thumbnails,
                } => {
                    self.view(slot).loading = None;
                    let page_count = thumbnails.len();
                    let document = self.controller.load_document(slot, name, bytes, page_count);
                    self.upload_thumbnails(ctx, document, thumbnails);
                }
                PdfUpdate::LoadFailed { slot, error } => {
                    self.view(slot).loading = None;
                    self.controller.load_failed(slot, &error);
                }
                PdfUpdate::LoadCancelled { slot } => {
                    self.view(slot).loading = None;
                    self.controller.load_cancelled(slot);
                }
                PdfUpdate::AssemblyProgress { slot, progress } => {
                    if let Some(task) = &mut self.view(slot).assembling {
                        task.progress = Some(progress);
                    }
                }
                PdfUpdate::AssemblyFinished { slot, result } => {
                    self.view(slot).assembling = None;
                    match result {
                        Ok(document) => {
                            let filename =
                                document.suggested_filename(&self.options.assembly.filename_prefix);
                            if let Some(path) = rfd::FileDialog::new()
                                .add_filter("PDF", &["pdf"])
                                .set_file_name(filename)
                                .save_file()
                            {
                                self.send(PdfCommand::SaveOutput { path, document });
                            } else {
                                self.controller
                                    .finish_assembly(slot, &Err(ArrangeError::Cancelled));
                            }
                        }
                        Err(e) => self.controller.finish_assembly(slot, &Err(e)),
                    }
                }
                PdfUpdate::Saved { path, document } => {
                    log::info!("{} PDF written to {}", document.slot, path.display());
                    self.controller.finish_assembly(document.slot, &Ok(document));
                }
                PdfUpdate::SaveFailed { slot, error } => {
                    self.controller.finish_assembly(slot, &Err(error));
                }
                PdfUpdate::ConfigLoaded { options } => {
                    self.controller.apply_options(&options);
                    self.options = options;
                    self.controller
                        .set_status(StatusMessage::success("Settings loaded"));
                }
                PdfUpdate::Error { message } => {
                    log::error!("{}", message);
                    self.controller
                        .set_status(StatusMessage::error(message));
                }
            }
        }
    }

    fn upload_thumbnails(
        &mut self,
        ctx: &egui::Context,
        document: DocumentId,
        thumbnails: Vec<RasterImage>,
    ) {
        for (i, thumb) in thumbnails.into_iter().enumerate() {
            let page = i as u32 + 1;
            let size = [thumb.width() as usize, thumb.height() as usize];
            let image = egui::ColorImage::from_rgba_unmultiplied(size, thumb.as_rgba_bytes());
            let texture = ctx.load_texture(
                format!("page_{}_{}", document.0, page),
                image,
                egui::TextureOptions::LINEAR,
            );
            self.textures.insert((document, page), texture);
        }

        // Release textures of documents nothing shows any more
        let pages = self.controller.pages();
        self.textures
            .retain(|(document, _), _| pages.source(*document).is_some());
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    fn slot_panel(&self, ui: &mut egui::Ui, slot: SlotId, actions: &mut Vec<Action>) -> SlotLayout {
        let view = &self.views[slot.index()];
        let pages = self.controller.pages();

        ui.horizontal(|ui| {
            ui.heading(format!("{slot} PDF"));
            let name = pages
                .slot_source(slot)
                .map(|source| source.display_name())
                .unwrap_or_else(|| "No PDF loaded".to_string());
            ui.label(name);
        });

        ui.horizontal(|ui| {
            let open = egui::Button::new("Open PDF...");
            if ui.add_enabled(view.loading.is_none(), open).clicked() {
                actions.push(Action::Open(slot));
            }
            let download = egui::Button::new("Download");
            if ui.add_enabled(view.assembling.is_none(), download).clicked() {
                actions.push(Action::Assemble(slot));
            }
        });

        if let Some(task) = &view.loading {
            progress_row(ui, "Loading", task, || actions.push(Action::CancelLoad(slot)));
        }
        if let Some(task) = &view.assembling {
            progress_row(ui, "Generating", task, || {
                actions.push(Action::CancelAssembly(slot))
            });
        }

        let dragging = self.controller.dragging();
        let forbidden = dragging.is_some_and(|session| session.forbids(slot));
        let mut frame = egui::Frame::group(ui.style());
        if forbidden {
            frame = frame.stroke(Stroke::new(2.0, ui.visuals().error_fg_color));
        }

        let mut entries = Vec::new();
        let frame_response = frame.show(ui, |ui| {
            ui.set_min_size(ui.available_size());
            egui::ScrollArea::vertical()
                .id_salt(("slot_pages", slot.index()))
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    if pages.sequence(slot).is_empty() {
                        ui.centered_and_justified(|ui| {
                            ui.weak("Drop a PDF here or use Open PDF...");
                        });
                        return;
                    }

                    ui.horizontal_wrapped(|ui| {
                        for entry in pages.sequence(slot) {
                            let texture = self.textures.get(&(entry.document(), entry.source_page()));
                            let image_size = texture
                                .map(|t| {
                                    let size = t.size_vec2();
                                    egui::vec2(THUMB_HEIGHT * size.x / size.y.max(1.0), THUMB_HEIGHT)
                                })
                                .unwrap_or(egui::vec2(THUMB_HEIGHT * 0.77, THUMB_HEIGHT));

                            let (rect, response) = ui.allocate_exact_size(
                                image_size + egui::vec2(0.0, LABEL_HEIGHT),
                                Sense::click_and_drag(),
                            );
                            let image_rect =
                                egui::Rect::from_min_size(rect.min, image_size);

                            let is_dragged =
                                dragging.is_some_and(|session| session.dragged() == entry.id());
                            let tint = if is_dragged {
                                Color32::from_white_alpha(90)
                            } else {
                                Color32::WHITE
                            };

                            let painter = ui.painter();
                            match texture {
                                Some(texture) => {
                                    painter.image(texture.id(), image_rect, FULL_UV, tint);
                                }
                                None => {
                                    painter.rect_filled(image_rect, 2.0, tint);
                                }
                            }

                            let border = if entry.is_copy() {
                                Stroke::new(3.0, COPY_COLOR)
                            } else if pages.is_displaced(entry.id()) {
                                Stroke::new(3.0, DISPLACED_COLOR)
                            } else {
                                Stroke::new(1.0, Color32::GRAY)
                            };
                            painter.rect_stroke(image_rect, 2.0, border, StrokeKind::Outside);
                            painter.text(
                                egui::pos2(rect.center().x, image_rect.bottom() + 2.0),
                                Align2::CENTER_TOP,
                                entry.label(),
                                FontId::proportional(12.0),
                                ui.visuals().text_color(),
                            );

                            if response.drag_started() {
                                actions.push(Action::DragStart(entry.id()));
                            }
                            response.context_menu(|ui| {
                                if ui.button("Delete page").clicked() {
                                    actions.push(Action::Delete(entry.id()));
                                    ui.close();
                                }
                            });

                            entries.push((entry.id(), rect));
                        }

                        self.paint_insertion_marker(ui, slot, &entries);
                    });
                });
        });

        entries.into_iter().fold(
            SlotLayout::new(slot, to_page_rect(frame_response.response.rect)),
            |layout, (entry, rect)| layout.with_entry(entry, to_page_rect(rect)),
        )
    }

    /// Vertical bar where the dragged page would land
    fn paint_insertion_marker(&self, ui: &egui::Ui, slot: SlotId, entries: &[(EntryId, egui::Rect)]) {
        let (Some(session), Some(target)) = (self.controller.dragging(), self.controller.drop_target())
        else {
            return;
        };
        if target.slot != slot {
            return;
        }

        // Ranks are counted without the dragged page
        let others: Vec<&egui::Rect> = entries
            .iter()
            .filter(|(entry, _)| *entry != session.dragged())
            .map(|(_, rect)| rect)
            .collect();
        let half_gap = ui.spacing().item_spacing.x / 2.0;

        let (x, rect) = match others.get(target.index) {
            Some(rect) => (rect.left() - half_gap, rect),
            None => match others.last() {
                Some(rect) => (rect.right() + half_gap, rect),
                None => return,
            },
        };

        ui.painter().line_segment(
            [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
            Stroke::new(3.0, COPY_COLOR),
        );
    }

    /// Follow the pointer while a page is being dragged
    fn track_drag(&mut self, ctx: &egui::Context, layouts: &[SlotLayout]) {
        let Some(session) = self.controller.dragging() else {
            return;
        };
        let dragged = session.dragged();

        let (pointer, released) =
            ctx.input(|i| (i.pointer.interact_pos(), i.pointer.any_released()));
        let Some(pos) = pointer else {
            if released {
                self.controller.drag_end();
            }
            return;
        };

        let point = geometry::Point::new(pos.x, pos.y);
        if released {
            self.controller.drop_dragged(layouts, point);
            return;
        }

        self.controller.drag_over(layouts, point);
        ctx.set_cursor_icon(CursorIcon::Grabbing);

        // Ghost of the dragged page under the pointer
        if let Some(entry) = self.controller.pages().entry(dragged) {
            let painter = ctx.layer_painter(egui::LayerId::new(
                egui::Order::Tooltip,
                egui::Id::new("drag_ghost"),
            ));
            let ghost = egui::Rect::from_center_size(pos, egui::vec2(THUMB_HEIGHT * 0.4, THUMB_HEIGHT * 0.5));
            let tint = Color32::from_white_alpha(160);
            match self.textures.get(&(entry.document(), entry.source_page())) {
                Some(texture) => {
                    painter.image(texture.id(), ghost, FULL_UV, tint);
                }
                None => {
                    painter.rect_filled(ghost, 2.0, tint);
                }
            }
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context, layouts: &[SlotLayout]) {
        let (files, hover) = ctx.input(|i| (i.raw.dropped_files.clone(), i.pointer.hover_pos()));
        if files.is_empty() {
            return;
        }

        let slot = hover.and_then(|pos| {
            geometry::hovered_slot(layouts, geometry::Point::new(pos.x, pos.y))
                .map(|layout| layout.slot)
        });
        let Some(slot) = slot else {
            self.controller.set_status(StatusMessage::info(
                "Drop the file onto the Left or Right slot",
            ));
            return;
        };

        let pdf = files.into_iter().filter_map(|file| file.path).find(|path| {
            path.extension()
                .and_then(|s| s.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        });
        match pdf {
            Some(path) => self.start_load(slot, path),
            None => self
                .controller
                .set_status(StatusMessage::error("Please drop a PDF file")),
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        if let Some(status) = self.controller.status() {
            let color = match status.kind {
                StatusKind::Info => ui.visuals().text_color(),
                StatusKind::Success => SUCCESS_COLOR,
                StatusKind::Error => ui.visuals().error_fg_color,
            };
            ui.colored_label(color, status.text.as_str());
        }

        egui::CollapsingHeader::new("Activity log").show(ui, |ui| {
            if ui.small_button("Clear").clicked() {
                self.activity.clear();
            }
            egui::ScrollArea::vertical()
                .max_height(150.0)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    for entry in self.activity.entries() {
                        ui.monospace(format!(
                            "{} {:<5} {}",
                            entry.timestamp.format("%H:%M:%S"),
                            entry.level,
                            entry.message
                        ));
                    }
                });
        });
    }
}

fn progress_row(ui: &mut egui::Ui, label: &str, task: &TaskState, mut on_cancel: impl FnMut()) {
    ui.horizontal(|ui| {
        let (fraction, text) = match task.progress {
            Some(progress) => (progress.fraction(), format!("{label} {}%", progress.percent())),
            None => (0.0, format!("{label}...")),
        };
        ui.add(egui::ProgressBar::new(fraction).text(text).desired_width(200.0));
        if ui.button("Cancel").clicked() {
            on_cancel();
        }
    });
}

fn to_page_rect(rect: egui::Rect) -> geometry::Rect {
    geometry::Rect::new(rect.min.x, rect.min.y, rect.width(), rect.height())
}

impl eframe::App for PdfArrangeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process all pending updates from worker
        self.process_updates(ctx);

        let cancel_requested = ctx.input(|i| {
            i.key_pressed(Key::Escape)
                || (i.modifiers.command && i.key_pressed(Key::C))
                || i.events.iter().any(|e| matches!(e, egui::Event::Copy))
        });
        if cancel_requested && (self.busy() || self.controller.dragging().is_some()) {
            self.cancel_all();
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.strong("PDF Arrange");
                ui.separator();
                if ui.button("Load settings...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .pick_file()
                    {
                        self.send(PdfCommand::LoadConfig { path });
                    }
                }
            });
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            self.status_bar(ui);
        });

        let mut actions = Vec::new();
        let mut layouts = Vec::with_capacity(SlotId::ALL.len());
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.columns(SlotId::ALL.len(), |columns| {
                for slot in SlotId::ALL {
                    layouts.push(self.slot_panel(&mut columns[slot.index()], slot, &mut actions));
                }
            });
        });

        self.track_drag(ctx, &layouts);
        self.handle_dropped_files(ctx, &layouts);

        for action in actions {
            self.apply_action(action);
        }

        if self.controller.dragging().is_some() {
            ctx.request_repaint();
        } else if self.busy() {
            // Worker updates do not wake the UI on their own
            ctx.request_repaint_after(Duration::from_millis(50));
        }
    }
}
