//! Metamodel of `crate::model::Shape`. Auto-generated by metagen, do not edit manually.
#![allow(warnings)]
/// Static metamodel of [`crate::model::Shape`].
pub struct Shape_;
impl Shape_ {
    pub const COLOR: &'static str = "color";
    pub const ID: &'static str = "id";
    /// @see crate::model::Shape.color
    pub const color: ::metagen::criteria::SingularAttribute<
        crate::model::Shape,
        crate::model::Color,
    > = super::Square_::color.cast();
    /// @see crate::model::Shape.id
    pub const id: ::metagen::criteria::SingularAttribute<crate::model::Shape, i64> = ::metagen::criteria::SingularAttribute::new(
        "id",
    );
    /// @see crate::model::Shape
    pub const class_: ::metagen::criteria::MappedSuperclassType<crate::model::Shape> = ::metagen::criteria::MappedSuperclassType::new(
        "Shape",
    );
}
pub trait ShapePath<X> {
    fn id_(&self) -> ::metagen::criteria::Expression<i64>;
}
impl<X, P> ShapePath<X> for P
where
    P: ::metagen::criteria::Path<X> + ?Sized,
    X: ::metagen::criteria::Extends<crate::model::Shape>,
{
    fn id_(&self) -> ::metagen::criteria::Expression<i64> {
        <P as ::metagen::criteria::Path<X>>::get(self, &Shape_::id)
    }
}
