pub mod colormap;
pub mod contour;
pub mod interp;
pub mod kernel;
pub mod linspace;
pub mod quadrature;
