use crate::errors::*;

/// Consumer of a clustering result, e.g. a plotting backend
///
/// The engines never draw anything themselves; they hand their points,
/// centres and a title to an implementation of this trait.
pub trait ClusterRenderer<T> {
    /// Render one clustering result
    ///
    /// ### Params
    ///
    /// * `clusters` - Points per cluster, in cluster order
    /// * `centres` - One centre per cluster
    /// * `title` - Title of the plot
    fn render(&mut self, clusters: &[Vec<&[T]>], centres: &[&[T]], title: &str);
}

/// Read access shared by the fitted clustering engines
pub trait ClusterModel<T> {
    /// Title used when handing the result to a renderer
    const TITLE: &'static str;

    /// Points per cluster
    fn clusters(&self) -> Result<Vec<Vec<&[T]>>>;

    /// One centre per cluster
    fn cluster_centers(&self) -> Result<Vec<&[T]>>;

    /// Hand the fitted result to a renderer
    ///
    /// ### Params
    ///
    /// * `renderer` - The consumer
    ///
    /// ### Returns
    ///
    /// `NotFitted` if called before `fit()`
    fn show<R>(&self, renderer: &mut R) -> Result<()>
    where
        R: ClusterRenderer<T>,
    {
        let clusters = self.clusters()?;
        let centres = self.cluster_centers()?;
        renderer.render(&clusters, &centres, Self::TITLE);
        Ok(())
    }
}
