//! Metamodel of `crate::model::Square`. Auto-generated by metagen, do not edit manually.
#![allow(warnings)]
/// Static metamodel of [`crate::model::Square`].
pub struct Square_;
impl Square_ {
    pub const COLOR: &'static str = "color";
    pub const ID: &'static str = "id";
    pub const OWNER: &'static str = "owner";
    pub const SIDE: &'static str = "side";
    /// @see crate::model::Square.color
    pub const color: ::metagen::criteria::SingularAttribute<
        crate::model::Square,
        crate::model::Color,
    > = ::metagen::criteria::SingularAttribute::new("color");
    /// @see crate::model::Square.owner
    pub const owner: ::metagen::criteria::SingularAttribute<
        crate::model::Square,
        crate::model::Owner,
    > = ::metagen::criteria::SingularAttribute::new("owner");
    /// @see crate::model::Square.side
    pub const side: ::metagen::criteria::SingularAttribute<crate::model::Square, f64> = ::metagen::criteria::SingularAttribute::new(
        "side",
    );
    /// @see crate::model::Square
    pub const class_: ::metagen::criteria::EntityType<crate::model::Square> = ::metagen::criteria::EntityType::new(
        "Square",
    );
}
pub trait SquarePath<X> {
    fn color_(&self) -> ::metagen::criteria::Expression<crate::model::Color>;
    fn owner_(&self) -> ::metagen::criteria::Expression<crate::model::Owner>;
    fn side_(&self) -> ::metagen::criteria::Expression<f64>;
}
impl<P> SquarePath<crate::model::Square> for P
where
    P: ::metagen::criteria::Path<crate::model::Square> + ?Sized,
{
    fn color_(&self) -> ::metagen::criteria::Expression<crate::model::Color> {
        <P as ::metagen::criteria::Path<crate::model::Square>>::get(self, &Square_::color)
    }
    fn owner_(&self) -> ::metagen::criteria::Expression<crate::model::Owner> {
        <P as ::metagen::criteria::Path<crate::model::Square>>::get(self, &Square_::owner)
    }
    fn side_(&self) -> ::metagen::criteria::Expression<f64> {
        <P as ::metagen::criteria::Path<crate::model::Square>>::get(self, &Square_::side)
    }
}
pub trait SquareFrom<X> {
    fn join_owner(
        &self,
        join_type: ::core::option::Option<::metagen::criteria::JoinType>,
    ) -> ::metagen::criteria::Join<X, crate::model::Owner>;
}
impl<P> SquareFrom<crate::model::Square> for P
where
    P: ::metagen::criteria::From<crate::model::Square> + ?Sized,
{
    fn join_owner(
        &self,
        join_type: ::core::option::Option<::metagen::criteria::JoinType>,
    ) -> ::metagen::criteria::Join<crate::model::Square, crate::model::Owner> {
        <P as ::metagen::criteria::From<
            crate::model::Square,
        >>::join(self, &Square_::owner, join_type.unwrap_or_default())
    }
}
impl ::metagen::criteria::Extends<crate::model::Shape> for crate::model::Square {}
