/// Coordinate mapping between a displayed image and its native raster
///
/// The native coordinate of a marker is authoritative; its display
/// coordinate is always derived from the current display size.

use serde::{Deserialize, Serialize};

/// Clicks closer than this to the marker (on both axes) clear it.
pub const TOGGLE_TOLERANCE_PX: f64 = 10.0;

/// Axis-aligned rectangle in viewport pixels
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Width and height in pixels (native or displayed)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_usable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// Live measurements of an image element and its container.
///
/// Whatever renders the image implements this; the mapping itself only
/// needs the four values.
pub trait ImageMeasurements {
    fn container_rect(&self) -> Rect;
    fn image_rect(&self) -> Rect;
    fn natural_size(&self) -> Size;
    fn display_size(&self) -> Size;
}

/// Fixed measurements, for headless use
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StaticMeasurements {
    pub container: Rect,
    pub image: Rect,
    pub natural: Size,
    pub display: Size,
}

impl ImageMeasurements for StaticMeasurements {
    fn container_rect(&self) -> Rect {
        self.container
    }

    fn image_rect(&self) -> Rect {
        self.image
    }

    fn natural_size(&self) -> Size {
        self.natural
    }

    fn display_size(&self) -> Size {
        self.display
    }
}

/// A position in display and native coordinates at once
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub display_x: f64,
    pub display_y: f64,
    pub natural_x: u32,
    pub natural_y: u32,
}

impl Marker {
    /// Marker at a native pixel, projected into `display`
    pub fn at_native(natural_x: u32, natural_y: u32, natural: Size, display: Size) -> Self {
        let mut marker = Self {
            display_x: 0.0,
            display_y: 0.0,
            natural_x,
            natural_y,
        };
        marker.reproject(natural, display);
        marker
    }

    /// Clamp the native position into `natural` and re-derive the display
    /// position from it
    pub fn reproject(&mut self, natural: Size, display: Size) {
        if !natural.is_usable() {
            return;
        }
        self.natural_x = self.natural_x.min(last_pixel(natural.width));
        self.natural_y = self.natural_y.min(last_pixel(natural.height));
        if !display.is_usable() {
            return;
        }
        self.display_x = self.natural_x as f64 * (display.width / natural.width);
        self.display_y = self.natural_y as f64 * (display.height / natural.height);
    }

    fn is_near(&self, x: f64, y: f64) -> bool {
        (x - self.display_x).abs() < TOGGLE_TOLERANCE_PX
            && (y - self.display_y).abs() < TOGGLE_TOLERANCE_PX
    }
}

/// Outcome of mapping one click
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapResult {
    /// Display or native size not usable; no mapping attempted
    Unavailable,
    /// Click landed outside the displayed image
    Outside,
    /// Click landed on the existing marker; drop it and its downstream state
    Cleared,
    Placed(Marker),
}

fn last_pixel(natural_dim: f64) -> u32 {
    (natural_dim.floor() - 1.0).max(0.0) as u32
}

fn clamp_axis(scaled: f64, natural_dim: f64) -> u32 {
    scaled.round().clamp(0.0, last_pixel(natural_dim) as f64) as u32
}

/// Map a pointer position to a native pixel, applying the toggle rule.
pub fn map_click(
    container: Rect,
    image: Rect,
    natural: Size,
    display: Size,
    pointer: Point,
    existing: Option<&Marker>,
) -> MapResult {
    if !display.is_usable() || !natural.is_usable() {
        log::debug!("Click ignored: display {:?}, natural {:?}", display, natural);
        return MapResult::Unavailable;
    }

    let offset_x = pointer.x - container.left - (image.left - container.left);
    let offset_y = pointer.y - container.top - (image.top - container.top);

    if !(0.0..=display.width).contains(&offset_x) || !(0.0..=display.height).contains(&offset_y) {
        return MapResult::Outside;
    }

    if existing.is_some_and(|m| m.is_near(offset_x, offset_y)) {
        return MapResult::Cleared;
    }

    let natural_x = clamp_axis(offset_x * (natural.width / display.width), natural.width);
    let natural_y = clamp_axis(offset_y * (natural.height / display.height), natural.height);

    MapResult::Placed(Marker {
        display_x: offset_x,
        display_y: offset_y,
        natural_x,
        natural_y,
    })
}

/// Map a click using live measurements
pub fn map_click_measured<M: ImageMeasurements + ?Sized>(
    measurements: &M,
    pointer: Point,
    existing: Option<&Marker>,
) -> MapResult {
    map_click(
        measurements.container_rect(),
        measurements.image_rect(),
        measurements.natural_size(),
        measurements.display_size(),
        pointer,
        existing,
    )
}

/// An image on screen together with its single marker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayedImage {
    natural: Size,
    display: Size,
    marker: Option<Marker>,
}

impl DisplayedImage {
    pub fn new(natural: Size, display: Size) -> Self {
        Self {
            natural,
            display,
            marker: None,
        }
    }

    pub fn natural(&self) -> Size {
        self.natural
    }

    pub fn display(&self) -> Size {
        self.display
    }

    pub fn marker(&self) -> Option<&Marker> {
        self.marker.as_ref()
    }

    /// Apply a click and keep the resulting marker state.
    ///
    /// Sizes are refreshed from `measurements` first; a size change
    /// reprojects the existing marker before the toggle rule is checked.
    pub fn click<M: ImageMeasurements + ?Sized>(&mut self, measurements: &M, pointer: Point) -> MapResult {
        self.set_natural(measurements.natural_size());
        self.resize(measurements.display_size());

        let result = map_click_measured(measurements, pointer, self.marker.as_ref());
        match result {
            MapResult::Placed(marker) => self.marker = Some(marker),
            MapResult::Cleared => self.marker = None,
            MapResult::Outside | MapResult::Unavailable => {}
        }
        result
    }

    /// New display size; the marker keeps its native position
    pub fn resize(&mut self, display: Size) {
        if display == self.display {
            return;
        }
        self.display = display;
        let natural = self.natural;
        if let Some(marker) = self.marker.as_mut() {
            marker.reproject(natural, display);
        }
    }

    /// New native size, e.g. a different composite image. The marker is
    /// clamped into the new raster.
    pub fn set_natural(&mut self, natural: Size) {
        self.natural = natural;
        let display = self.display;
        if let Some(marker) = self.marker.as_mut() {
            marker.reproject(natural, display);
        }
    }

    /// Place the marker at a native pixel, clamped into the raster
    pub fn place_native(&mut self, x: u32, y: u32) -> Marker {
        let marker = Marker::at_native(x, y, self.natural, self.display);
        self.marker = Some(marker);
        marker
    }

    pub fn clear_marker(&mut self) {
        self.marker = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(display: f64) -> StaticMeasurements {
        StaticMeasurements {
            container: Rect::new(10.0, 20.0, 800.0, 800.0),
            image: Rect::new(50.0, 20.0, display, display),
            natural: Size::new(681.0, 681.0),
            display: Size::new(display, display),
        }
    }

    fn placed(result: MapResult) -> Marker {
        match result {
            MapResult::Placed(m) => m,
            other => panic!("expected marker, got {:?}", other),
        }
    }

    #[test]
    fn test_scaling_and_rounding() {
        let m = square(340.5);
        // Offset (100, 50) at half scale -> (200, 100)
        let marker = placed(map_click_measured(&m, Point::new(150.0, 70.0), None));
        assert_eq!((marker.display_x, marker.display_y), (100.0, 50.0));
        assert_eq!((marker.natural_x, marker.natural_y), (200, 100));
    }

    #[test]
    fn test_native_coordinate_always_clamped() {
        let m = square(400.0);
        for step in 0..=400 {
            let p = Point::new(50.0 + step as f64, 20.0 + (400 - step) as f64);
            let marker = placed(map_click_measured(&m, p, None));
            assert!(marker.natural_x <= 680);
            assert!(marker.natural_y <= 680);
        }
        // Right/bottom edge rounds past the last pixel and is clamped
        let edge = placed(map_click_measured(&m, Point::new(450.0, 420.0), None));
        assert_eq!((edge.natural_x, edge.natural_y), (680, 680));
    }

    #[test]
    fn test_outside_rejected() {
        let m = square(400.0);
        assert_eq!(map_click_measured(&m, Point::new(49.0, 100.0), None), MapResult::Outside);
        assert_eq!(map_click_measured(&m, Point::new(100.0, 421.0), None), MapResult::Outside);
    }

    #[test]
    fn test_zero_display_fails_closed() {
        let mut m = square(400.0);
        m.display = Size::new(0.0, 400.0);
        assert_eq!(map_click_measured(&m, Point::new(60.0, 30.0), None), MapResult::Unavailable);
        let mut m = square(400.0);
        m.natural = Size::new(681.0, -1.0);
        assert_eq!(map_click_measured(&m, Point::new(60.0, 30.0), None), MapResult::Unavailable);
    }

    #[test]
    fn test_toggle_is_two_cycle() {
        let m = square(400.0);
        let mut image = DisplayedImage::new(m.natural, m.display);
        let p = Point::new(150.0, 120.0);

        assert!(matches!(image.click(&m, p), MapResult::Placed(_)));
        assert_eq!(image.click(&m, Point::new(159.0, 111.0)), MapResult::Cleared);
        assert!(image.marker().is_none());
        assert!(matches!(image.click(&m, p), MapResult::Placed(_)));
        assert!(image.marker().is_some());
    }

    #[test]
    fn test_toggle_needs_both_axes_close() {
        let m = square(400.0);
        let first = placed(map_click_measured(&m, Point::new(150.0, 120.0), None));
        let moved = map_click_measured(&m, Point::new(155.0, 130.0), Some(&first));
        assert!(matches!(moved, MapResult::Placed(_)));
    }

    #[test]
    fn test_resize_reprojects_from_native() {
        let m = square(681.0);
        let mut image = DisplayedImage::new(m.natural, m.display);
        image.click(&m, Point::new(50.0 + 300.0, 20.0 + 100.0));

        image.resize(Size::new(340.5, 340.5));
        let marker = *image.marker().unwrap();
        assert_eq!((marker.natural_x, marker.natural_y), (300, 100));
        assert_eq!((marker.display_x, marker.display_y), (150.0, 50.0));

        image.resize(Size::new(681.0, 681.0));
        assert_eq!(image.marker().unwrap().display_x, 300.0);
    }

    #[test]
    fn test_place_native_clamps_into_raster() {
        let mut image = DisplayedImage::new(Size::new(681.0, 681.0), Size::new(681.0, 681.0));
        let marker = image.place_native(900, 5);
        assert_eq!((marker.natural_x, marker.natural_y), (680, 5));
        assert_eq!(marker.display_x, 680.0);
    }

    #[test]
    fn test_smaller_natural_size_clamps_marker() {
        let mut image = DisplayedImage::new(Size::new(681.0, 681.0), Size::new(681.0, 681.0));
        image.place_native(600, 500);

        image.set_natural(Size::new(100.0, 100.0));
        let marker = *image.marker().unwrap();
        assert_eq!((marker.natural_x, marker.natural_y), (99, 99));
        assert!((marker.display_x - 99.0 * 6.81).abs() < 1e-9);
        assert!(marker.display_x < 681.0);
    }

    #[test]
    fn test_click_with_new_natural_size_clamps_existing_marker() {
        let mut image = DisplayedImage::new(Size::new(681.0, 681.0), Size::new(400.0, 400.0));
        image.place_native(600, 20);

        // Pointer outside the image: only the refreshed sizes take effect
        let mut m = square(400.0);
        m.natural = Size::new(50.0, 50.0);
        assert_eq!(image.click(&m, Point::new(0.0, 0.0)), MapResult::Outside);
        let marker = *image.marker().unwrap();
        assert_eq!((marker.natural_x, marker.natural_y), (49, 20));
        assert_eq!(marker.display_x, 49.0 * 8.0);
    }

    #[test]
    fn test_click_after_resize_uses_reprojected_marker() {
        let mut image = DisplayedImage::new(Size::new(681.0, 681.0), Size::new(681.0, 681.0));
        image.place_native(300, 100);

        // At half size the marker sits at display (150, 50)
        let small = square(340.5);
        assert_eq!(image.click(&small, Point::new(50.0 + 152.0, 20.0 + 48.0)), MapResult::Cleared);
    }
}
