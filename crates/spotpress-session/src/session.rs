//! The editing session: owns the original raster, the parameter
//! history, both masks, and the collaborators needed to render.

use image::{GrayImage, RgbaImage};
use spotpress_pipeline::layer::{ImageLayer, Layer, LayerId, TextLayer};
use spotpress_pipeline::render::{CompositeResult, FontCatalog, MemoryAssets, render_layers};
use spotpress_pipeline::{PipelineError, mask, segment};
use spotpress_providers::FallbackChain;

use crate::fill::{FillError, generative_fill};
use crate::history::{DEFAULT_CAPACITY, History};
use crate::scheduler::{FillTracker, RenderScheduler, RenderTicket};
use crate::state::EditorState;
use crate::store::ConfigStore;

/// An editing session over one loaded design.
///
/// The original raster is read-only for the session's lifetime;
/// every render recomputes the derived raster from it. Parameter
/// edits go through [`update`](Self::update) so each one lands in the
/// undo history.
pub struct EditorSession {
    original: RgbaImage,
    history: History<EditorState>,
    manual_mask: GrayImage,
    fill_mask: GrayImage,
    fonts: FontCatalog,
    assets: MemoryAssets,
    store: ConfigStore,
    scheduler: RenderScheduler<EditorState>,
    fill_tracker: FillTracker,
    next_layer_id: u64,
}

impl EditorSession {
    /// Start a session over a decoded design.
    ///
    /// The manual mask starts fully kept and the fill mask fully
    /// empty. If the image corners agree on a background color, it is
    /// pre-seeded as a removal target.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ZeroDimensions`] for an empty raster.
    pub fn new(original: RgbaImage) -> Result<Self, PipelineError> {
        let (width, height) = original.dimensions();
        if width == 0 || height == 0 {
            return Err(PipelineError::ZeroDimensions { width, height });
        }

        let mut state = EditorState::default();
        if let Some(background) = segment::detect_background(&original) {
            state.recolor.remove_targets.push(background);
        }

        Ok(Self {
            manual_mask: mask::new_manual_mask(width, height),
            fill_mask: mask::new_fill_mask(width, height),
            original,
            history: History::new(state, DEFAULT_CAPACITY),
            fonts: FontCatalog::new(),
            assets: MemoryAssets::new(),
            store: ConfigStore::new(),
            scheduler: RenderScheduler::new(),
            fill_tracker: FillTracker::new(),
            next_layer_id: 0,
        })
    }

    /// The read-only source raster.
    #[must_use]
    pub const fn original(&self) -> &RgbaImage {
        &self.original
    }

    /// The current parameter state.
    #[must_use]
    pub fn state(&self) -> &EditorState {
        self.history.current()
    }

    /// Apply an edit to a copy of the current state and record it as
    /// a new history snapshot.
    pub fn update(&mut self, edit: impl FnOnce(&mut EditorState)) {
        let mut next = self.history.current().clone();
        edit(&mut next);
        self.history.push(next);
    }

    /// Step the parameter state back one snapshot.
    pub fn undo(&mut self) -> bool {
        self.history.undo().is_some()
    }

    /// Step the parameter state forward one snapshot.
    pub fn redo(&mut self) -> bool {
        self.history.redo().is_some()
    }

    /// Allocate the next layer id. Ids are monotonic and never
    /// reused within a session.
    pub fn allocate_layer_id(&mut self) -> LayerId {
        self.next_layer_id += 1;
        LayerId(self.next_layer_id)
    }

    /// Append a text layer with editor defaults, returning its id.
    pub fn add_text_layer(&mut self, text: impl Into<String>) -> LayerId {
        let id = self.allocate_layer_id();
        let layer = TextLayer::new(id, text);
        self.update(|state| state.layers.push(Layer::Text(layer)));
        id
    }

    /// Remove a layer by id. Returns whether anything was removed.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        let exists = self.state().layers.iter().any(|layer| layer.id() == id);
        if exists {
            self.update(|state| state.layers.retain(|layer| layer.id() != id));
        }
        exists
    }

    /// Font registry for text layers.
    pub fn fonts_mut(&mut self) -> &mut FontCatalog {
        &mut self.fonts
    }

    /// Image assets referenced by layers.
    pub fn assets_mut(&mut self) -> &mut MemoryAssets {
        &mut self.assets
    }

    /// The session's configuration store.
    #[must_use]
    pub const fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Mutable access to the configuration store.
    pub fn store_mut(&mut self) -> &mut ConfigStore {
        &mut self.store
    }

    /// Stroke the manual mask with the state's brush: erase removes
    /// coverage, restore paints it back.
    pub fn paint_manual(&mut self, from: (f64, f64), to: (f64, f64), erase: bool) {
        let value = if erase { 0 } else { 255 };
        let brush = self.state().brush_size;
        mask::paint_stroke(&mut self.manual_mask, from, to, brush, value);
    }

    /// Stroke the fill selection mask.
    pub fn paint_fill_selection(&mut self, from: (f64, f64), to: (f64, f64)) {
        let brush = self.state().brush_size;
        mask::paint_stroke(&mut self.fill_mask, from, to, brush, 255);
    }

    /// Clear the fill selection mask.
    pub fn clear_fill_selection(&mut self) {
        mask::clear(&mut self.fill_mask, 0);
    }

    /// Recompute the derived raster and composite the layer stack.
    ///
    /// # Errors
    ///
    /// Propagates pipeline errors; individual layer failures are
    /// reported in the result, not as errors.
    pub fn render(&self) -> Result<CompositeResult, PipelineError> {
        let state = self.history.current();
        let derived = spotpress_pipeline::process(
            &self.original,
            &state.recolor,
            Some(&self.manual_mask),
            &state.filters,
        )?;
        Ok(render_layers(&derived, &state.layers, &self.fonts, &self.assets))
    }

    /// Ask the render scheduler for work with the current state.
    /// Returns a ticket when idle; otherwise the state is parked.
    pub fn queue_render(&mut self) -> Option<RenderTicket<EditorState>> {
        let state = self.history.current().clone();
        self.scheduler.submit(state)
    }

    /// Report a finished scheduled render, receiving follow-up work
    /// if edits arrived meanwhile.
    pub fn render_complete(&mut self, generation: u64) -> Option<RenderTicket<EditorState>> {
        self.scheduler.complete(generation)
    }

    /// Run the generative-fill workflow over the painted selection
    /// and commit the result as a new image layer covering the
    /// canvas. On success the fill selection is cleared; on failure
    /// nothing changes.
    ///
    /// The fill tracker generation advances with each call, so hosts
    /// that run the provider call off-thread can drive supersession
    /// through the tracker; this synchronous path holds `&mut self`
    /// for the whole workflow and never observes
    /// [`FillError::Superseded`] itself.
    ///
    /// # Errors
    ///
    /// Returns a [`FillError`] from the workflow; the session state,
    /// masks, and layer stack are untouched in that case.
    pub fn generative_fill(
        &mut self,
        instruction: &str,
        chain: &FallbackChain,
    ) -> Result<LayerId, FillError> {
        let generation = self.fill_tracker.begin();
        let composited = self.render()?;
        let patch = generative_fill(&composited.image, &self.fill_mask, instruction, chain)?;

        if !self.fill_tracker.finish(generation) {
            return Err(FillError::Superseded);
        }

        let id = self.allocate_layer_id();
        let handle = format!("fill-{}", id.0);
        self.assets.insert(handle.clone(), patch);
        self.update(move |state| {
            state.layers.push(Layer::Image(ImageLayer {
                id,
                source: handle,
                x: 50.0,
                y: 50.0,
                scale: 100.0,
                rotation: 0.0,
            }));
        });
        self.clear_fill_selection();
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use image::Rgba;
    use spotpress_pipeline::Rgb;
    use spotpress_providers::{GenerationProvider, GenerationRequest, ProviderError};
    use std::io::Cursor;

    fn design() -> RgbaImage {
        let mut raster = RgbaImage::from_pixel(24, 24, Rgba([40, 40, 40, 255]));
        for y in 8..16 {
            for x in 8..16 {
                raster.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        raster
    }

    #[test]
    fn corner_background_is_pre_seeded() {
        let session = EditorSession::new(design()).unwrap();
        assert_eq!(
            session.state().recolor.remove_targets,
            vec![Rgb::new(40, 40, 40)]
        );
    }

    #[test]
    fn zero_sized_design_is_rejected() {
        assert!(matches!(
            EditorSession::new(RgbaImage::new(0, 5)),
            Err(PipelineError::ZeroDimensions { .. })
        ));
    }

    #[test]
    fn updates_are_undoable() {
        let mut session = EditorSession::new(design()).unwrap();
        session.update(|state| state.filters.brightness = 40.0);
        assert!((session.state().filters.brightness - 40.0).abs() < f64::EPSILON);
        assert!(session.undo());
        assert!(session.state().filters.is_neutral());
        assert!(session.redo());
        assert!((session.state().filters.brightness - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn layer_ids_are_monotonic_across_removal() {
        let mut session = EditorSession::new(design()).unwrap();
        let first = session.add_text_layer("one");
        let second = session.add_text_layer("two");
        assert!(second > first);
        assert!(session.remove_layer(first));
        assert!(!session.remove_layer(first));
        let third = session.add_text_layer("three");
        assert!(third > second, "removed ids are never reused");
    }

    #[test]
    fn render_composites_the_background_removal() {
        let session = EditorSession::new(design()).unwrap();
        let result = session.render().unwrap();
        assert!(result.skipped.is_empty());
        assert_eq!(result.image.get_pixel(12, 12)[3], 255, "subject kept");
        assert_eq!(result.image.get_pixel(4, 18)[3], 0, "backdrop removed");
    }

    #[test]
    fn manual_erase_removes_subject_pixels() {
        let mut session = EditorSession::new(design()).unwrap();
        session.paint_manual((12.0, 12.0), (12.0, 12.0), true);
        let result = session.render().unwrap();
        assert_eq!(result.image.get_pixel(12, 12)[3], 0);
    }

    #[test]
    fn queued_renders_coalesce() {
        let mut session = EditorSession::new(design()).unwrap();
        let ticket = session.queue_render().unwrap();
        session.update(|state| state.filters.brightness = 10.0);
        assert!(session.queue_render().is_none());
        session.update(|state| state.filters.brightness = 20.0);
        assert!(session.queue_render().is_none());

        let next = session.render_complete(ticket.generation).unwrap();
        assert!((next.params.filters.brightness - 20.0).abs() < f64::EPSILON);
    }

    struct EchoProvider;

    impl GenerationProvider for EchoProvider {
        fn name(&self) -> &str {
            "echo"
        }

        fn generate(&self, _request: &GenerationRequest) -> Result<Vec<u8>, ProviderError> {
            Err(ProviderError::InvalidResponse(String::from("unsupported")))
        }

        fn fill_region(
            &self,
            _image_png: &[u8],
            _instruction: &str,
        ) -> Result<Vec<u8>, ProviderError> {
            let canvas = RgbaImage::from_pixel(24, 24, Rgba([0, 0, 255, 255]));
            let mut bytes = Cursor::new(Vec::new());
            canvas
                .write_to(&mut bytes, image::ImageFormat::Png)
                .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
            Ok(bytes.into_inner())
        }
    }

    #[test]
    fn generative_fill_commits_a_patch_layer_and_clears_the_mask() {
        let mut session = EditorSession::new(design()).unwrap();
        session.paint_fill_selection((12.0, 12.0), (12.0, 12.0));
        let chain = FallbackChain::new().with(Box::new(EchoProvider));

        let id = session.generative_fill("make it blue", &chain).unwrap();
        let layers = &session.state().layers;
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].id(), id);

        // The committed patch renders at the painted spot.
        let result = session.render().unwrap();
        assert!(result.skipped.is_empty());
        assert_eq!(result.image.get_pixel(12, 12)[2], 255);

        // The transient mask was cleared, so a second fill with an
        // empty selection produces an empty patch, not residue.
        assert!(session.fill_mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn sequential_fills_both_commit() {
        let mut session = EditorSession::new(design()).unwrap();
        let chain = FallbackChain::new().with(Box::new(EchoProvider));

        session.paint_fill_selection((6.0, 6.0), (6.0, 6.0));
        let first = session.generative_fill("blue here", &chain).unwrap();
        session.paint_fill_selection((18.0, 18.0), (18.0, 18.0));
        let second = session.generative_fill("blue there", &chain).unwrap();

        assert!(second > first);
        assert_eq!(session.state().layers.len(), 2);
    }

    #[test]
    fn failed_fill_changes_nothing() {
        struct DownProvider;
        impl GenerationProvider for DownProvider {
            fn name(&self) -> &str {
                "down"
            }
            fn generate(&self, _r: &GenerationRequest) -> Result<Vec<u8>, ProviderError> {
                Err(ProviderError::NetworkFailure(String::from("offline")))
            }
            fn fill_region(&self, _i: &[u8], _t: &str) -> Result<Vec<u8>, ProviderError> {
                Err(ProviderError::NetworkFailure(String::from("offline")))
            }
        }

        let mut session = EditorSession::new(design()).unwrap();
        session.paint_fill_selection((12.0, 12.0), (12.0, 12.0));
        let chain = FallbackChain::new().with(Box::new(DownProvider));

        let err = session.generative_fill("anything", &chain).unwrap_err();
        assert!(matches!(err, FillError::Providers(_)));
        assert!(session.state().layers.is_empty());
        assert!(
            session.fill_mask.pixels().any(|p| p[0] == 255),
            "selection survives a failed fill"
        );
    }
}
