use std::fmt::{Display, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::render::{Filter, FilterUnit, Font, Renderer};

/// Discriminates the closed set of node variants.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    Group,
    Text,
    Image,
    Shape,
}

/// Represents an entity of the scene graph.
///
/// A `Node` is a cheap-clonable handle over shared state: cloning it clones the handle, not
/// the node, so animations can keep a reference to a node that the scene graph owns. A node is
/// either a [`NodeType::Group`] (an ordered container of child nodes, drawn and updated in
/// insertion order) or a drawable leaf (image, text, rectangle shape).
///
/// All leaves share the same attribute set: position, per-tick orientation (a constant
/// velocity applied by the default [`Node::update`]), rotation, scale, size and opacity.
/// Attribute setters are the only mutation path used by animations; `set_rotation`,
/// `set_scale` and `set_size` raise the `transform` flag which switches drawing to the
/// translate → rotate-about-center semantics.
///
/// # Example
/// ```
/// use orrery::scene::Node;
///
/// let root = Node::group();
/// let bubble = Node::image("bubble_0", "bubble.png");
/// bubble.set_position(400.0, 800.0);
/// root.append_child(bubble);
/// assert_eq!(root.size(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Node {
    inner: Arc<RwLock<NodeInner>>,
}

#[derive(Debug)]
struct NodeInner {
    attributes: Attributes,
    kind: NodeKind,
}

/// Attributes shared by every node variant.
#[derive(Clone, Debug)]
struct Attributes {
    x: f64,
    y: f64,
    orientation_x: f64,
    orientation_y: f64,
    transform: bool,
    rotate: bool,
    rotation_angle: f64,
    scale: bool,
    scale_x: f64,
    scale_y: f64,
    width: f64,
    height: f64,
    alpha: f64,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            orientation_x: 0.0,
            orientation_y: 0.0,
            transform: false,
            rotate: false,
            rotation_angle: 0.0,
            scale: false,
            scale_x: 0.0,
            scale_y: 0.0,
            width: 0.0,
            height: 0.0,
            alpha: 1.0,
        }
    }
}

#[derive(Debug)]
enum NodeKind {
    Group { children: Vec<Node> },
    Image(ImageData),
    Text(TextData),
    Rect(RectData),
}

/// The data backing an image node. The actual asset decoding is the host's business: the
/// natural size is reported through [`Node::on_load`] once available.
#[derive(Clone, Debug)]
pub struct ImageData {
    id: String,
    path: String,
    use_width: Option<f64>,
    use_height: Option<f64>,
    natural_width: f64,
    natural_height: f64,
    loaded: bool,
    filters: Vec<Filter>,
}

impl ImageData {
    /// Returns the identifier of the image.
    pub fn get_id(&self) -> &str {
        &self.id
    }
    /// Returns the path of the backing asset.
    pub fn get_path(&self) -> &str {
        &self.path
    }
    /// Returns the natural size of the decoded asset (zero until loaded).
    pub fn get_natural_size(&self) -> (f64, f64) {
        (self.natural_width, self.natural_height)
    }
    /// Indicates if the backing asset has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
    /// Returns the filters currently attached to the image.
    pub fn get_filters(&self) -> &[Filter] {
        &self.filters
    }
}

#[derive(Clone, Debug)]
struct TextData {
    text: String,
    fill_style: String,
    font: Font,
}

#[derive(Clone, Debug)]
struct RectData {
    fill_style: Option<String>,
}

impl Node {
    /// Creates an empty group node.
    pub fn group() -> Self {
        Self::with_kind(NodeKind::Group { children: vec![] })
    }

    /// Creates an image node for the given asset path.
    ///
    /// The display size defaults to the natural size of the asset once loaded; an explicit
    /// display size can be requested with [`Node::with_size`].
    pub fn image<S: Into<String>, P: Into<String>>(id: S, path: P) -> Self {
        Self::with_kind(NodeKind::Image(ImageData {
            id: id.into(),
            path: path.into(),
            use_width: None,
            use_height: None,
            natural_width: 0.0,
            natural_height: 0.0,
            loaded: false,
            filters: vec![],
        }))
    }

    /// Creates a text node.
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self::with_kind(NodeKind::Text(TextData {
            text: text.into(),
            fill_style: String::from("red"),
            font: Font::default(),
        }))
    }

    /// Creates a rectangle shape node of the given size.
    pub fn rect(width: f64, height: f64) -> Self {
        Self::with_kind(NodeKind::Rect(RectData { fill_style: None })).with_display_size(width, height)
    }

    fn with_kind(kind: NodeKind) -> Self {
        Self {
            inner: Arc::new(RwLock::new(NodeInner {
                attributes: Attributes::default(),
                kind,
            })),
        }
    }

    // ########################################
    // Builders

    /// Requests an explicit display size for an image node, overriding the natural size that
    /// would otherwise be applied on load. On other nodes this behaves as a plain size change.
    pub fn with_size(self, width: f64, height: f64) -> Self {
        {
            let inner = &mut *self.inner.write();
            if let NodeKind::Image(image) = &mut inner.kind {
                image.use_width = Some(width);
                image.use_height = Some(height);
            }
            inner.attributes.width = width;
            inner.attributes.height = height;
        }
        self
    }

    fn with_display_size(self, width: f64, height: f64) -> Self {
        {
            let inner = &mut *self.inner.write();
            inner.attributes.width = width;
            inner.attributes.height = height;
        }
        self
    }

    /// Sets the fill style of a rectangle or text node.
    pub fn with_fill_style<S: Into<String>>(self, style: S) -> Self {
        self.set_fill_style(style);
        self
    }

    /// Sets the font of a text node.
    pub fn with_font(self, font: Font) -> Self {
        {
            let inner = &mut *self.inner.write();
            if let NodeKind::Text(text) = &mut inner.kind {
                text.font = font;
            } else {
                log::warn!("with_font called on a non-text node: ignored");
            }
        }
        self
    }

    /// Sets the per-tick orientation (velocity) of the node.
    pub fn with_orientation(self, x: f64, y: f64) -> Self {
        self.set_orientation(x, y);
        self
    }

    // ########################################
    // Group operations

    /// Appends a child node to a group. Insertion order is update/draw order.
    pub fn append_child(&self, child: Node) {
        let inner = &mut *self.inner.write();
        match &mut inner.kind {
            NodeKind::Group { children } => children.push(child),
            _ => log::warn!("append_child called on a non-group node: ignored"),
        }
    }

    /// Checks if a group contains at least one node (non-group nodes are never empty).
    pub fn is_empty(&self) -> bool {
        match &self.inner.read().kind {
            NodeKind::Group { children } => children.is_empty(),
            _ => false,
        }
    }

    /// Returns the number of children of a group node (zero for leaves).
    pub fn size(&self) -> usize {
        match &self.inner.read().kind {
            NodeKind::Group { children } => children.len(),
            _ => 0,
        }
    }

    /// Returns the child node at the given index.
    pub fn get(&self, index: usize) -> Option<Node> {
        match &self.inner.read().kind {
            NodeKind::Group { children } => children.get(index).cloned(),
            _ => None,
        }
    }

    /// Returns the children handles of a group node.
    pub fn get_children(&self) -> Vec<Node> {
        match &self.inner.read().kind {
            NodeKind::Group { children } => children.clone(),
            _ => vec![],
        }
    }

    // ########################################
    // Attribute setters: the only mutation path used by animations.

    /// Sets the position of the node. Does not raise the `transform` flag.
    pub fn set_position(&self, x: f64, y: f64) {
        let attributes = &mut self.inner.write().attributes;
        attributes.x = x;
        attributes.y = y;
    }

    /// Sets the rotation angle (in degrees) of the node. Raises the `transform` flag; the
    /// rotate flag follows the last set angle (a zero angle clears it).
    pub fn set_rotation(&self, angle: f64) {
        let attributes = &mut self.inner.write().attributes;
        attributes.transform = true;
        attributes.rotate = angle != 0.0;
        attributes.rotation_angle = angle;
    }

    /// Sets the size of the node. Raises the `transform` flag.
    pub fn set_size(&self, width: f64, height: f64) {
        let attributes = &mut self.inner.write().attributes;
        attributes.transform = true;
        attributes.width = width;
        attributes.height = height;
    }

    /// Sets the scale of the node. Raises the `transform` flag; the scale flag clears when
    /// both factors are 1.
    pub fn set_scale(&self, scale_x: f64, scale_y: f64) {
        let attributes = &mut self.inner.write().attributes;
        attributes.transform = true;
        attributes.scale = !(scale_x == 1.0 && scale_y == 1.0);
        attributes.scale_x = scale_x;
        attributes.scale_y = scale_y;
    }

    /// Sets the per-tick orientation (velocity) applied by the default update.
    pub fn set_orientation(&self, x: f64, y: f64) {
        let attributes = &mut self.inner.write().attributes;
        attributes.orientation_x = x;
        attributes.orientation_y = y;
    }

    /// Sets the opacity of the node (0 = transparent, 1 = opaque).
    pub fn set_alpha(&self, alpha: f64) {
        self.inner.write().attributes.alpha = alpha;
    }

    /// Sets (or replaces) a filter entry on an image node.
    pub fn set_filter<S: Into<String>>(&self, kind: S, value: f64, unit: FilterUnit) {
        let kind = kind.into();
        let inner = &mut *self.inner.write();
        match &mut inner.kind {
            NodeKind::Image(image) => {
                match image.filters.iter_mut().find(|filter| filter.kind == kind) {
                    Some(filter) => {
                        filter.value = value;
                        filter.unit = unit;
                    }
                    None => image.filters.push(Filter { kind, value, unit }),
                }
            }
            _ => log::warn!("set_filter called on a non-image node: ignored"),
        }
    }

    /// Changes the content of a text node.
    pub fn set_text<S: Into<String>>(&self, text: S) {
        let inner = &mut *self.inner.write();
        match &mut inner.kind {
            NodeKind::Text(data) => data.text = text.into(),
            _ => log::warn!("set_text called on a non-text node: ignored"),
        }
    }

    /// Changes the fill style of a rectangle or text node.
    pub fn set_fill_style<S: Into<String>>(&self, style: S) {
        let style = style.into();
        let inner = &mut *self.inner.write();
        match &mut inner.kind {
            NodeKind::Rect(data) => data.fill_style = Some(style),
            NodeKind::Text(data) => data.fill_style = style,
            _ => log::warn!("set_fill_style called on a non-shape node: ignored"),
        }
    }

    /// Resets an image node display size to the natural size of its asset.
    pub fn resize_to_image_size(&self) {
        let inner = &mut *self.inner.write();
        if let NodeKind::Image(image) = &inner.kind {
            let (width, height) = (image.natural_width, image.natural_height);
            inner.attributes.width = width;
            inner.attributes.height = height;
        }
    }

    /// Load completion hook for image nodes: records the natural size of the decoded asset
    /// and applies the display size (explicit when requested, natural otherwise).
    pub fn on_load(&self, natural_width: f64, natural_height: f64) {
        let inner = &mut *self.inner.write();
        if let NodeKind::Image(image) = &mut inner.kind {
            image.natural_width = natural_width;
            image.natural_height = natural_height;
            image.loaded = true;
            inner.attributes.width = image.use_width.unwrap_or(natural_width);
            inner.attributes.height = image.use_height.unwrap_or(natural_height);
        }
    }

    // ########################################
    // Getters

    /// Returns the variant of this node.
    pub fn get_type(&self) -> NodeType {
        match &self.inner.read().kind {
            NodeKind::Group { .. } => NodeType::Group,
            NodeKind::Image(_) => NodeType::Image,
            NodeKind::Text(_) => NodeType::Text,
            NodeKind::Rect(_) => NodeType::Shape,
        }
    }

    /// Returns the position of the node.
    pub fn get_position(&self) -> (f64, f64) {
        let attributes = &self.inner.read().attributes;
        (attributes.x, attributes.y)
    }

    /// Returns the size of the node.
    pub fn get_size(&self) -> (f64, f64) {
        let attributes = &self.inner.read().attributes;
        (attributes.width, attributes.height)
    }

    /// Returns the rotation angle (in degrees) of the node.
    pub fn get_rotation(&self) -> f64 {
        self.inner.read().attributes.rotation_angle
    }

    /// Returns the scale factors of the node.
    pub fn get_scale(&self) -> (f64, f64) {
        let attributes = &self.inner.read().attributes;
        (attributes.scale_x, attributes.scale_y)
    }

    /// Returns the per-tick orientation (velocity) of the node.
    pub fn get_orientation(&self) -> (f64, f64) {
        let attributes = &self.inner.read().attributes;
        (attributes.orientation_x, attributes.orientation_y)
    }

    /// Returns the opacity of the node.
    pub fn get_alpha(&self) -> f64 {
        self.inner.read().attributes.alpha
    }

    /// Indicates if the node draws through the transformed (translate/rotate-about-center)
    /// path.
    pub fn is_transformed(&self) -> bool {
        self.inner.read().attributes.transform
    }

    /// Indicates if a rotation is currently applied.
    pub fn is_rotated(&self) -> bool {
        self.inner.read().attributes.rotate
    }

    /// Indicates if a scale is currently applied.
    pub fn is_scaled(&self) -> bool {
        self.inner.read().attributes.scale
    }

    /// Returns the natural asset size of an image node (None for other variants).
    pub fn get_natural_size(&self) -> Option<(f64, f64)> {
        match &self.inner.read().kind {
            NodeKind::Image(image) => Some((image.natural_width, image.natural_height)),
            _ => None,
        }
    }

    /// Indicates if the backing asset of an image node has been loaded (false for other
    /// variants).
    pub fn is_loaded(&self) -> bool {
        match &self.inner.read().kind {
            NodeKind::Image(image) => image.loaded,
            _ => false,
        }
    }

    // ########################################
    // Tick operations

    /// Updates the node for one tick: groups recurse into their children in insertion order,
    /// leaves apply their per-tick orientation to their position.
    pub fn update(&self) {
        let inner = &mut *self.inner.write();
        match &inner.kind {
            NodeKind::Group { children } => {
                for child in children {
                    child.update();
                }
            }
            _ => {
                inner.attributes.x += inner.attributes.orientation_x;
                inner.attributes.y += inner.attributes.orientation_y;
            }
        }
    }

    /// Draws the node: groups recurse in insertion order, leaves emit renderer primitives
    /// from their current attributes. Attributes are only read here: mutation during the
    /// draw phase is not permitted by contract.
    pub fn draw(&self, renderer: &mut dyn Renderer, ratio: f64) {
        let inner = &*self.inner.read();
        let attributes = &inner.attributes;
        match &inner.kind {
            NodeKind::Group { children } => {
                for child in children {
                    child.draw(renderer, ratio);
                }
            }
            NodeKind::Image(image) => {
                renderer.set_alpha(attributes.alpha);
                renderer.set_filters(&image.filters);
                if attributes.transform {
                    Self::draw_transformed(renderer, image, attributes);
                } else {
                    renderer.draw_image(image, attributes.x, attributes.y);
                }
            }
            NodeKind::Text(text) => {
                renderer.set_alpha(attributes.alpha);
                renderer.fill_text(
                    &text.text,
                    &text.font,
                    &text.fill_style,
                    attributes.x,
                    attributes.y + text.font.size,
                );
            }
            NodeKind::Rect(rect) => {
                renderer.set_alpha(attributes.alpha);
                renderer.fill_rect(
                    rect.fill_style.as_deref(),
                    attributes.x,
                    attributes.y,
                    attributes.width,
                    attributes.height,
                );
            }
        }
    }

    /// Transformed drawing: move the origin to the node center, rotate if a rotation is
    /// applied, then draw centered.
    fn draw_transformed(renderer: &mut dyn Renderer, image: &ImageData, attributes: &Attributes) {
        renderer.save();
        renderer.translate(
            attributes.x + (attributes.width / 2.0),
            attributes.y + (attributes.height / 2.0),
        );
        if attributes.rotate {
            renderer.rotate(attributes.rotation_angle.to_radians());
        }
        renderer.draw_image_sized(
            image,
            -(attributes.width / 2.0),
            -(attributes.height / 2.0),
            attributes.width,
            attributes.height,
        );
        renderer.restore();
    }
}

/// Two node handles are equal when they point to the same underlying node.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let inner = &*self.inner.read();
        match &inner.kind {
            NodeKind::Group { children } => write!(f, "Group [children={}]", children.len()),
            NodeKind::Image(image) => write!(f, "Image [id={}, path={}]", image.id, image.path),
            NodeKind::Text(text) => write!(f, "Text [text={}]", text.text),
            NodeKind::Rect(_) => write!(
                f,
                "Shape [size={}x{}]",
                inner.attributes.width, inner.attributes.height
            ),
        }
    }
}
