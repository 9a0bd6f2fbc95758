//! Metamodel of `crate::model::Owner`. Auto-generated by metagen, do not edit manually.
#![allow(warnings)]
/// Static metamodel of [`crate::model::Owner`].
pub struct Owner_;
impl Owner_ {
    pub const NAME: &'static str = "name";
    pub const SQUARES: &'static str = "squares";
    /// @see crate::model::Owner.name
    pub const name: ::metagen::criteria::SingularAttribute<
        crate::model::Owner,
        ::std::string::String,
    > = ::metagen::criteria::SingularAttribute::new("name");
    /// @see crate::model::Owner.squares
    pub const squares: ::metagen::criteria::ListAttribute<
        crate::model::Owner,
        crate::model::Square,
    > = ::metagen::criteria::ListAttribute::new("squares");
    /// @see crate::model::Owner
    pub const class_: ::metagen::criteria::EntityType<crate::model::Owner> = ::metagen::criteria::EntityType::new(
        "Owner",
    );
}
pub trait OwnerPath<X> {
    fn name_(&self) -> ::metagen::criteria::Expression<::std::string::String>;
    fn squares_(
        &self,
    ) -> ::metagen::criteria::Expression<::metagen::criteria::List<crate::model::Square>>;
}
impl<P> OwnerPath<crate::model::Owner> for P
where
    P: ::metagen::criteria::Path<crate::model::Owner> + ?Sized,
{
    fn name_(&self) -> ::metagen::criteria::Expression<::std::string::String> {
        <P as ::metagen::criteria::Path<crate::model::Owner>>::get(self, &Owner_::name)
    }
    fn squares_(
        &self,
    ) -> ::metagen::criteria::Expression<::metagen::criteria::List<crate::model::Square>> {
        <P as ::metagen::criteria::Path<crate::model::Owner>>::get(self, &Owner_::squares)
    }
}
pub trait OwnerFrom<X> {
    fn join_squares(
        &self,
        join_type: ::core::option::Option<::metagen::criteria::JoinType>,
    ) -> ::metagen::criteria::ListJoin<X, crate::model::Square>;
}
impl<P> OwnerFrom<crate::model::Owner> for P
where
    P: ::metagen::criteria::From<crate::model::Owner> + ?Sized,
{
    fn join_squares(
        &self,
        join_type: ::core::option::Option<::metagen::criteria::JoinType>,
    ) -> ::metagen::criteria::ListJoin<crate::model::Owner, crate::model::Square> {
        <P as ::metagen::criteria::From<
            crate::model::Owner,
        >>::join(self, &Owner_::squares, join_type.unwrap_or_default())
    }
}
