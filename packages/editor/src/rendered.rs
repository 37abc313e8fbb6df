//! Boundary to the render host.
//!
//! Rendered nodes stay on the host's side; marker recovery only ever needs
//! two reads from them, so that is the whole trait. The engine never calls
//! back into the host.

/// One node of the host's rendered output.
pub trait RenderedElement {
    /// Literal attribute value, as rendered.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Computed style value for a property name, custom properties
    /// included. Inherited values are visible here, which is why style
    /// markers are probed rather than enumerated.
    fn computed_property(&self, name: &str) -> Option<String>;
}

impl<T: RenderedElement + ?Sized> RenderedElement for &T {
    fn attribute(&self, name: &str) -> Option<String> {
        (**self).attribute(name)
    }

    fn computed_property(&self, name: &str) -> Option<String> {
        (**self).computed_property(name)
    }
}
