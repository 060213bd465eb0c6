//! E-paper panel and renderer traits

use core::ops::Range;

use inktag_hal::SerialFlash;

/// Errors while drawing an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RenderError {
    /// Panel busy line never released
    PanelTimeout,
    /// Image payload could not be read back
    Flash,
    /// Payload range does not match the panel frame size
    SizeMismatch,
}

/// "Image complete" notification handed to the renderer
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompletedImage {
    /// Id of the completed image
    pub image_id: u32,
    /// Flash address range of the payload
    pub payload: Range<u32>,
}

impl CompletedImage {
    /// Payload length in bytes
    pub fn len(&self) -> u32 {
        self.payload.end - self.payload.start
    }

    /// True when the payload range is empty
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Consumer of completed images
pub trait Renderer {
    /// Draw `image`, reading its payload from `flash`
    fn render<F: SerialFlash>(
        &mut self,
        flash: &mut F,
        image: &CompletedImage,
    ) -> Result<(), RenderError>;
}

/// Low-level e-paper panel command set
///
/// Calls happen in order: `setup`, `reset`, `init`, `draw_start`,
/// `data` for every frame byte, `display`, `shutdown`.
pub trait EpdPanel {
    /// Configure pins for talking to the panel
    fn setup(&mut self);

    /// Power the panel and pulse its reset line
    fn reset(&mut self) -> Result<(), RenderError>;

    /// Program the controller (gate count, waveform LUT, border)
    fn init(&mut self) -> Result<(), RenderError>;

    /// Set the RAM window and start a frame write
    fn draw_start(&mut self);

    /// Send one frame byte (8 pixels, MSB leftmost)
    fn data(&mut self, byte: u8);

    /// Refresh the panel from RAM and wait for it to finish
    fn display(&mut self) -> Result<(), RenderError>;

    /// Enter deep sleep and cut panel power
    fn shutdown(&mut self);

    /// Bytes in one full frame
    fn frame_len(&self) -> u32;
}
