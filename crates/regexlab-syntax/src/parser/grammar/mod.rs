mod atoms;
mod charclass;
mod groups;
mod quantifiers;
