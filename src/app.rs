use std::{
    fs::File,
    path::{Path, PathBuf},
};

use eframe::emath::Rot2;
use egui::{
    epaint::Vertex, panel::TopBottomSide, Color32, ColorImage, ComboBox, Context, DragValue, Mesh,
    Pos2, Rect, Rounding, Sense, Shape, Stroke, TextureHandle, TextureId, Ui, Vec2,
};
use png::{BitDepth, ColorType};

use crate::{
    export,
    render::{self, Bitmap, OUTLINE_COLOR, OUTLINE_WIDTH},
    Design, CASE_MODELS,
};

/// We derive Deserialize/Serialize so we can persist app state on shutdown.
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old state
pub struct CaseApp {
    design: Design,
    image_path: Option<PathBuf>,

    #[serde(skip)]
    image: Option<Bitmap>,
    #[serde(skip)]
    texture: Option<TextureHandle>,
    #[serde(skip)]
    last_error: Option<String>,
}

impl Default for CaseApp {
    fn default() -> Self {
        Self {
            design: Design::default(),
            image_path: None,
            image: None,
            texture: None,
            last_error: None,
        }
    }
}

impl CaseApp {
    /// Called once before the first frame.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        // Load previous app state (if any).
        // Note that you must enable the `persistence` feature for this to work.
        if let Some(storage) = cc.storage {
            return eframe::get_value(storage, eframe::APP_KEY).unwrap_or_default();
        }

        Default::default()
    }

    fn load_image(&mut self, ctx: &Context) {
        let Some(path) = self.image_path.as_ref() else {
            return;
        };

        let bitmap = match decode_png(path) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("Failed to decode {}; {}", path.display(), e);
                self.last_error = Some(e);
                self.image_path = None;
                return;
            }
        };

        let image = ColorImage::from_rgba_unmultiplied(
            [bitmap.width as usize, bitmap.height as usize],
            &bitmap.pixels,
        );
        let tex = ctx.load_texture(
            path.display().to_string(),
            image,
            egui::TextureFilter::Linear,
        );

        self.image = Some(bitmap);
        self.texture = Some(tex);
        self.last_error = None;
    }

    fn export(&mut self) {
        let Some(image) = self.image.as_ref() else {
            self.last_error = Some("Load an image before printing".to_string());
            return;
        };

        let flat = render::flatten(self.design.model(), &self.design.placement, Some(image));

        match export::export_flattened(&flat) {
            Ok(path) => {
                self.last_error = None;
                eprintln!("Wrote print render to {}", path.display());
            }
            Err(e) => {
                eprintln!("Print export failed; {:?}", e);
                self.last_error = Some(format!("Print export failed: {}", e));
            }
        }
    }
}

impl eframe::App for CaseApp {
    /// Called by the frame work to save state before shutdown.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, self);
    }

    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Re-decode a persisted image path if the texture is gone
        if self.image_path.is_some() && self.texture.is_none() {
            self.load_image(ctx);
        }

        egui::TopBottomPanel::new(TopBottomSide::Top, "Controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                // Load image
                if ui.button("Load image").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("PNG", &["png"])
                        .pick_file()
                    {
                        self.image_path = Some(path);
                        self.load_image(ui.ctx());
                    }
                }

                model_selector(ui, &mut self.design);
            });

            placement_controls(ui, &mut self.design.placement);

            ui.horizontal(|ui| {
                if ui.button("Print").clicked() {
                    self.export();
                }

                if let Some(err) = &self.last_error {
                    ui.colored_label(Color32::LIGHT_RED, err);
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            case_canvas(ui, &mut self.design, self.texture.as_ref());
        });
    }
}

/// Decode a PNG into an RGBA8 bitmap, rejecting anything the flattener can't take
fn decode_png(path: &Path) -> Result<Bitmap, String> {
    let file =
        File::open(path).map_err(|e| format!("Failed to open {}; {:?}", path.display(), e))?;

    let decoder = png::Decoder::new(file);
    let mut reader = decoder
        .read_info()
        .map_err(|e| format!("Not a readable PNG: {}", e))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| format!("Failed to decode frame: {}", e))?;

    if info.bit_depth != BitDepth::Eight {
        return Err(format!("Bit depth must be 8, got {:?}", info.bit_depth));
    }

    if info.color_type != ColorType::Rgba {
        return Err(format!("Color type must be RGBA, got {:?}", info.color_type));
    }

    buf.truncate(info.buffer_size());

    Bitmap::from_rgba(info.width, info.height, buf).ok_or_else(|| "Truncated PNG data".to_string())
}

fn model_selector(ui: &mut Ui, design: &mut Design) {
    ComboBox::from_label("Model")
        .selected_text(design.model().label)
        .show_ui(ui, |ui| {
            for (idx, model) in CASE_MODELS.iter().enumerate() {
                ui.selectable_value(&mut design.model, idx, model.label);
            }
        });
}

fn placement_controls(ui: &mut Ui, placement: &mut crate::Placement) {
    ui.horizontal(|ui| {
        // XY
        ui.add(
            DragValue::new(&mut placement.position[0])
                .prefix("X: ")
                .speed(1.0),
        );
        ui.add(
            DragValue::new(&mut placement.position[1])
                .prefix("Y: ")
                .speed(1.0),
        );

        // Scale
        ui.add(
            DragValue::new(&mut placement.scale)
                .prefix("Scale: ")
                .speed(0.01)
                .clamp_range(0.05..=20.0),
        );

        // Rotate
        ui.add(
            DragValue::new(&mut placement.rotation)
                .prefix("Angle: ")
                .suffix("°")
                .speed(0.25),
        );
    });
}

/// Drawing surface: silhouette for the selected model plus the transformed image.
/// Dragging anywhere on it pins the image center to the pointer.
fn case_canvas(ui: &mut Ui, design: &mut Design, texture: Option<&TextureHandle>) {
    let model = design.model();
    let size = Vec2::new(model.bounds[0] as f32, model.bounds[1] as f32);

    let (response, painter) = ui.allocate_painter(size, Sense::drag());

    if response.dragged() {
        if let Some(pos) = response.interact_pointer_pos() {
            let local = pos - response.rect.min;
            design.placement.position = [local.x, local.y];
        }
    }

    // Case silhouette
    let [r, g, b, _] = OUTLINE_COLOR;
    painter.rect_stroke(
        Rect::from_min_size(response.rect.min, size),
        Rounding::none(),
        Stroke::new(OUTLINE_WIDTH, Color32::from_rgb(r, g, b)),
    );

    // User image, scaled then rotated about its center
    if let Some(texture) = texture {
        let center = response.rect.min + Vec2::from(design.placement.position);
        let size = texture.size_vec2() * design.placement.scale;
        painter.add(image_quad(
            texture.id(),
            center,
            size,
            design.placement.rotation.to_radians(),
        ));
    }
}

fn image_quad(tex_id: TextureId, center: Pos2, size: Vec2, angle: f32) -> Shape {
    let rot = Rot2::from_angle(angle);
    let radius = size / 2.;

    let corners = [
        Vec2::new(-radius.x, -radius.y),
        Vec2::new(radius.x, -radius.y),
        Vec2::new(radius.x, radius.y),
        Vec2::new(-radius.x, radius.y),
    ];
    let uvs = [
        Pos2::new(0., 0.),
        Pos2::new(1., 0.),
        Pos2::new(1., 1.),
        Pos2::new(0., 1.),
    ];

    let mut mesh = Mesh::with_texture(tex_id);
    for (corner, uv) in corners.into_iter().zip(uvs) {
        mesh.vertices.push(Vertex {
            pos: center + rot * corner,
            uv,
            color: Color32::WHITE,
        });
    }
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);

    Shape::mesh(mesh)
}
